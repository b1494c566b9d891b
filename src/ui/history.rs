use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use typlax::{
    history::{HistorySummary, SessionResult},
    modes::ModeId,
    util::format_time,
};

use crate::App;

/// Pure presenter for a single history row
pub fn present_row(result: &SessionResult) -> Row<'static> {
    let accuracy_color = if result.accuracy >= 95 {
        Color::Green
    } else if result.accuracy >= 85 {
        Color::Yellow
    } else {
        Color::Red
    };

    Row::new(vec![
        Cell::from(result.mode.mode().name),
        Cell::from(result.final_wpm.to_string())
            .style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{}%", result.accuracy)).style(Style::default().fg(accuracy_color)),
        Cell::from(format_time(result.time_seconds)),
        Cell::from(result.error_count.to_string()),
        Cell::from(result.fastest_burst.to_string()),
        Cell::from(format!("±{}", result.consistency)),
        Cell::from(result.timestamp.format("%Y-%m-%d %H:%M").to_string()),
    ])
}

/// One-line totals shown under the title
pub fn present_summary(summary: &HistorySummary) -> String {
    format!(
        "tests {}  ·  avg wpm {}  ·  avg accuracy {}%  ·  best wpm {}  ·  total time {}",
        summary.sessions,
        summary.average_wpm,
        summary.average_accuracy,
        summary.best_wpm,
        format_time(summary.total_time_seconds)
    )
}

/// Best WPM per mode among `results`, in catalog order
pub fn best_by_mode(results: &[SessionResult]) -> Vec<(ModeId, u32)> {
    let grouped = results.iter().into_group_map_by(|r| r.mode);

    ModeId::ALL
        .into_iter()
        .filter_map(|id| {
            grouped
                .get(&id)
                .and_then(|rs| rs.iter().map(|r| r.final_wpm).max())
                .map(|best| (id, best))
        })
        .collect()
}

/// Render the history screen
pub fn render_history(app: &App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(2), // Totals
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Bests
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let title = Paragraph::new(format!("Last {} sessions", app.recent.len()))
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let totals = Paragraph::new(present_summary(&HistorySummary::from_results(&app.recent)))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    f.render_widget(totals, chunks[1]);

    if app.recent.is_empty() {
        let no_data = Paragraph::new("No sessions recorded yet. Finish a passage to start one.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[2]);
    } else {
        let header = Row::new(vec![
            Cell::from("Mode"),
            Cell::from("WPM"),
            Cell::from("Acc"),
            Cell::from("Time"),
            Cell::from("Errors"),
            Cell::from("Burst"),
            Cell::from("Cons"),
            Cell::from("When"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let widths = [
            Constraint::Length(14),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Min(16),
        ];

        let table = Table::new(app.recent.iter().map(present_row), widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Recent"))
            .column_spacing(2);
        f.render_widget(table, chunks[2]);
    }

    let bests = best_by_mode(&app.recent)
        .into_iter()
        .map(|(id, wpm)| format!("{} {wpm}", id.mode().name))
        .join("  ·  ");
    if !bests.is_empty() {
        let bests = Paragraph::new(format!("best: {bests}"))
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .wrap(Wrap { trim: true });
        f.render_widget(bests, chunks[3]);
    }

    let instructions = Paragraph::new("(b/backspace) back  (n) new passage  (esc) quit")
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(instructions, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn result(mode: ModeId, wpm: u32) -> SessionResult {
        SessionResult {
            mode,
            final_wpm: wpm,
            raw_wpm: wpm,
            accuracy: 97,
            time_seconds: 42.0,
            character_count: 200,
            error_count: 6,
            fastest_burst: wpm + 12,
            consistency: 5,
            timestamp: Local.with_ymd_and_hms(2024, 6, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_best_by_mode_in_catalog_order() {
        let results = vec![
            result(ModeId::CarRacing, 70),
            result(ModeId::TreeGrowing, 50),
            result(ModeId::CarRacing, 82),
            result(ModeId::TreeGrowing, 45),
        ];

        assert_eq!(
            best_by_mode(&results),
            vec![(ModeId::TreeGrowing, 50), (ModeId::CarRacing, 82)]
        );
        assert!(best_by_mode(&[]).is_empty());
    }

    #[test]
    fn test_present_summary() {
        let results = vec![result(ModeId::CarRacing, 70), result(ModeId::TvStatic, 81)];
        let line = present_summary(&HistorySummary::from_results(&results));

        assert_eq!(
            line,
            "tests 2  ·  avg wpm 76  ·  avg accuracy 97%  ·  best wpm 81  ·  total time 1:24"
        );
    }

    #[test]
    fn test_present_summary_of_nothing() {
        let line = present_summary(&HistorySummary::from_results(&[]));
        assert_eq!(
            line,
            "tests 0  ·  avg wpm 0  ·  avg accuracy 0%  ·  best wpm 0  ·  total time 0:00"
        );
    }
}
