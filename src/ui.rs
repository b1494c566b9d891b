pub mod charting;
pub mod history;
pub mod keyboard;
pub mod screen;

pub use history::render_history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, Gauge, GraphType, Paragraph, Widget, Wrap},
};
use typlax::{
    modes::Mode,
    util::{format_time, progress_percent},
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Terminal colors for the current mode. Mode primaries are scene
/// backgrounds, so foreground roles draw from secondary and accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub emphasis: Color,
    pub gauge: Color,
    pub highlight: Color,
    pub correct: Color,
    pub incorrect: Color,
}

impl Palette {
    pub fn for_mode(mode: &Mode, high_contrast: bool) -> Self {
        if high_contrast {
            return Self {
                emphasis: Color::White,
                gauge: Color::Yellow,
                highlight: Color::Cyan,
                correct: Color::LightGreen,
                incorrect: Color::LightRed,
            };
        }

        let rgb = |(r, g, b): (u8, u8, u8)| Color::Rgb(r, g, b);
        Self {
            emphasis: rgb(mode.colors.secondary),
            gauge: rgb(mode.colors.accent),
            highlight: rgb(mode.colors.accent),
            correct: Color::Green,
            incorrect: Color::Red,
        }
    }
}

fn palette(app: &App) -> Palette {
    Palette::for_mode(app.session.mode().mode(), app.config.high_contrast)
}

/// Lines the prompt occupies when wrapped to `width`
fn prompt_lines(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    let text_width = text.width();
    if text_width <= width {
        1
    } else {
        (text_width as f64 / width as f64).ceil() as u16 + 1
    }
}

pub fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let palette = palette(app);
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = dim_bold_style.add_modifier(Modifier::UNDERLINED);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let validator = app.session.validator();
    let text = validator.expected_text();
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
    let prompt_occupied_lines = prompt_lines(&text, max_chars_per_line);
    let keyboard_lines = if app.config.show_keyboard {
        keyboard::KEYBOARD_HEIGHT
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(1)
        .constraints([
            Constraint::Length(1), // mode
            Constraint::Min(0),
            Constraint::Length(1), // hud
            Constraint::Length(1), // progress
            Constraint::Length(1),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Length(1), // milestone
            Constraint::Min(0),
            Constraint::Length(keyboard_lines),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let mode = app.session.mode().mode();
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!("{} {}", mode.icon, mode.name),
            bold_style.fg(palette.emphasis),
        ),
        Span::styled(format!("  {}", mode.difficulty), italic_style),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let hud = &app.hud;
    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {}   {} errors",
            hud.wpm,
            hud.accuracy,
            format_time(hud.elapsed_time),
            hud.error_count
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let percent = progress_percent(validator.position(), validator.expected_len());
    Gauge::default()
        .gauge_style(Style::default().fg(palette.gauge))
        .ratio((validator.progress() / 100.0).clamp(0.0, 1.0))
        .label(format!("{percent}%"))
        .render(chunks[3], buf);

    let correct_style = bold_style.fg(palette.correct);
    let incorrect_style = bold_style.fg(palette.incorrect);
    let typed = validator.typed_chars();
    let mut spans = text
        .chars()
        .enumerate()
        .map(|(idx, expected)| {
            if idx < typed.len() {
                if validator.is_error_at(idx) {
                    let shown = match typed[idx] {
                        ' ' => '·',
                        c => c,
                    };
                    Span::styled(shown.to_string(), incorrect_style)
                } else {
                    Span::styled(expected.to_string(), correct_style)
                }
            } else if idx == typed.len() {
                Span::styled(expected.to_string(), underlined_dim_bold_style)
            } else {
                Span::styled(expected.to_string(), dim_bold_style)
            }
        })
        .collect::<Vec<Span>>();
    if spans.is_empty() {
        spans.push(Span::styled("(nothing to type)", italic_style));
    }

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);

    if let Some(milestone) = app.last_milestone {
        Paragraph::new(Span::styled(
            format!("{milestone}% complete!"),
            bold_style.fg(palette.highlight),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    }

    if app.config.show_keyboard {
        keyboard::render_keyboard(
            validator.expected_char(),
            dim_bold_style,
            bold_style.fg(Color::Black).bg(palette.highlight),
            chunks[8],
            buf,
        );
    }

    Paragraph::new(Span::styled(
        "(←) restart / (→) new passage / (esc)ape",
        italic_style,
    ))
    .render(chunks[9], buf);
}

pub fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let palette = palette(app);
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // burst / consistency
            Constraint::Length(1), // personal best
            Constraint::Length(1), // summary
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let stats = app.session.final_stats().unwrap_or(app.hud);
    let points = charting::sample_points(&app.session.metrics().wpm_samples());

    if points.is_empty() {
        Paragraph::new(Span::styled(
            "session too short for a speed chart",
            italic_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);
    } else {
        let (overall_duration, highest_wpm) =
            charting::compute_chart_params(&points, stats.elapsed_time);
        let datasets = vec![Dataset::default()
            .marker(Marker::Braille)
            .style(Style::default().fg(palette.emphasis))
            .graph_type(GraphType::Line)
            .data(&points)];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, overall_duration])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(charting::format_label(overall_duration), bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, highest_wpm])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(charting::format_label(highest_wpm), bold_style),
                    ]),
            )
            .render(chunks[0], buf);
    }

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {} raw   {}% acc   {}   {} errors",
            stats.wpm,
            stats.raw_wpm,
            stats.accuracy,
            format_time(stats.elapsed_time),
            stats.error_count
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "fastest burst {} wpm   consistency ±{} wpm",
            stats.fastest_burst, stats.consistency
        ),
        Style::default().fg(palette.emphasis),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let best = match app.best_wpm {
        Some(best) if stats.wpm >= best => "new personal best for this mode!".to_string(),
        Some(best) => format!("personal best for this mode: {best} wpm"),
        None => String::new(),
    };
    Paragraph::new(Span::styled(
        best,
        Style::default()
            .fg(palette.highlight)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    if let Some(summary) = app.session.summary() {
        Paragraph::new(Span::styled(
            format!("?{}", summary.to_query()),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (h)istory / (backspace) correct / (esc)ape",
        italic_style,
    ))
    .render(chunks[6], buf);
}
