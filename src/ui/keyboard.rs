use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// US layout rows, unshifted
const ROWS: [&str; 4] = ["`1234567890-=", "qwertyuiop[]\\", "asdfghjkl;'", "zxcvbnm,./"];

/// Shifted characters on the same physical key as their unshifted partner
const SHIFTED: [(char, char); 21] = [
    ('~', '`'),
    ('!', '1'),
    ('@', '2'),
    ('#', '3'),
    ('$', '4'),
    ('%', '5'),
    ('^', '6'),
    ('&', '7'),
    ('*', '8'),
    ('(', '9'),
    (')', '0'),
    ('_', '-'),
    ('+', '='),
    ('{', '['),
    ('}', ']'),
    ('|', '\\'),
    (':', ';'),
    ('"', '\''),
    ('<', ','),
    ('>', '.'),
    ('?', '/'),
];

/// Key on the on-screen keyboard that produces `c`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCap {
    /// Row and column in the character rows
    Key(usize, usize),
    Space,
}

pub fn key_for(c: char) -> Option<KeyCap> {
    if c == ' ' {
        return Some(KeyCap::Space);
    }

    let base = SHIFTED
        .iter()
        .find(|(shifted, _)| *shifted == c)
        .map_or(c.to_ascii_lowercase(), |(_, base)| *base);

    ROWS.iter().enumerate().find_map(|(row, keys)| {
        keys.chars()
            .position(|k| k == base)
            .map(|col| KeyCap::Key(row, col))
    })
}

/// Lines needed to draw the keyboard
pub const KEYBOARD_HEIGHT: u16 = 5;

/// Renders the keyboard with the key for `expected` highlighted
pub fn render_keyboard(
    expected: Option<char>,
    key_style: Style,
    highlight_style: Style,
    area: Rect,
    buf: &mut Buffer,
) {
    let target = expected.and_then(key_for);

    let mut lines = ROWS
        .iter()
        .enumerate()
        .map(|(row, keys)| {
            let spans = keys
                .chars()
                .enumerate()
                .map(|(col, k)| {
                    let style = if target == Some(KeyCap::Key(row, col)) {
                        highlight_style
                    } else {
                        key_style
                    };
                    Span::styled(format!(" {k} "), style)
                })
                .collect::<Vec<Span>>();
            Line::from(spans)
        })
        .collect::<Vec<Line>>();

    let space_style = if target == Some(KeyCap::Space) {
        highlight_style
    } else {
        key_style
    };
    lines.push(Line::from(Span::styled(
        format!("{:^24}", "space"),
        space_style.add_modifier(Modifier::DIM),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_map_case_insensitively() {
        assert_eq!(key_for('q'), Some(KeyCap::Key(1, 0)));
        assert_eq!(key_for('Q'), Some(KeyCap::Key(1, 0)));
        assert_eq!(key_for('m'), Some(KeyCap::Key(3, 6)));
    }

    #[test]
    fn test_shifted_symbols_share_their_key() {
        assert_eq!(key_for('!'), key_for('1'));
        assert_eq!(key_for('?'), key_for('/'));
        assert_eq!(key_for('"'), key_for('\''));
    }

    #[test]
    fn test_space_and_unknown() {
        assert_eq!(key_for(' '), Some(KeyCap::Space));
        assert_eq!(key_for('é'), None);
    }
}
