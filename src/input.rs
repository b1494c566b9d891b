use std::collections::BTreeSet;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Label of the key that un-types the last character
pub const BACKSPACE: &str = "Backspace";

/// A key press as seen by the validator: its label plus whether a
/// control/alt/meta modifier was held. Shift is not a modifier here, it is
/// already folded into the label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub label: String,
    pub has_modifier: bool,
}

impl KeyPress {
    pub fn new(label: impl Into<String>, has_modifier: bool) -> Self {
        Self {
            label: label.into(),
            has_modifier,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(c.to_string(), false)
    }

    pub fn backspace() -> Self {
        Self::new(BACKSPACE, false)
    }

    pub fn is_backspace(&self) -> bool {
        self.label == BACKSPACE
    }

    /// The typed character if the label is exactly one visible character
    pub fn as_char(&self) -> Option<char> {
        let mut chars = self.label.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}

impl From<KeyEvent> for KeyPress {
    fn from(key: KeyEvent) -> Self {
        let has_modifier = key.modifiers.intersects(
            KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META,
        );

        let label = match key.code {
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Backspace => BACKSPACE.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Esc => "Escape".to_string(),
            other => format!("{other:?}"),
        };

        Self {
            label,
            has_modifier,
        }
    }
}

pub type CharacterTypedFn = Box<dyn FnMut(char, bool, usize)>;
pub type CompleteFn = Box<dyn FnMut()>;

/// Validates key presses against a fixed expected text.
///
/// Every typed character consumes a slot of the text, right or wrong; the
/// only way to fix a mistake is backspace, which also works after the end
/// of the text has been reached. `on_complete` fires the first time the end
/// is reached and not again until [`InputValidator::reset`]. An empty
/// expected text is a session that is complete from the start and never
/// fires `on_complete`.
pub struct InputValidator {
    expected: Vec<char>,
    position: usize,
    typed: Vec<char>,
    errors: BTreeSet<usize>,
    completed: bool,
    on_character_typed: CharacterTypedFn,
    on_complete: CompleteFn,
}

impl InputValidator {
    pub fn new<F, G>(expected_text: &str, on_character_typed: F, on_complete: G) -> Self
    where
        F: FnMut(char, bool, usize) + 'static,
        G: FnMut() + 'static,
    {
        Self {
            expected: expected_text.chars().collect(),
            position: 0,
            typed: Vec::new(),
            errors: BTreeSet::new(),
            completed: false,
            on_character_typed: Box::new(on_character_typed),
            on_complete: Box::new(on_complete),
        }
    }

    /// Returns true if the key was taken as input (typed or deleted)
    pub fn handle_key_event(&mut self, key: &KeyPress) -> bool {
        if key.has_modifier {
            return false;
        }

        if key.is_backspace() {
            self.delete_last();
            return true;
        }

        let Some(typed_char) = key.as_char() else {
            return false;
        };

        if self.is_complete() {
            return false;
        }

        let position = self.position;
        let is_correct = typed_char == self.expected[position];

        self.typed.push(typed_char);
        if !is_correct {
            self.errors.insert(position);
        }

        (self.on_character_typed)(typed_char, is_correct, position);

        self.position += 1;

        if self.position == self.expected.len() && !self.completed {
            self.completed = true;
            (self.on_complete)();
        }

        true
    }

    fn delete_last(&mut self) {
        if self.position > 0 {
            self.position -= 1;
            self.typed.pop();
            self.errors.remove(&self.position);
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn expected_text(&self) -> String {
        self.expected.iter().collect()
    }

    pub fn expected_len(&self) -> usize {
        self.expected.len()
    }

    /// Next character to type, or None once complete
    pub fn expected_char(&self) -> Option<char> {
        self.expected.get(self.position).copied()
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn typed_chars(&self) -> &[char] {
        &self.typed
    }

    pub fn error_positions(&self) -> BTreeSet<usize> {
        self.errors.clone()
    }

    pub fn is_error_at(&self, position: usize) -> bool {
        self.errors.contains(&position)
    }

    /// Percentage of the text consumed. An empty text reports 100.
    pub fn progress(&self) -> f64 {
        if self.expected.is_empty() {
            return 100.0;
        }
        100.0 * self.position as f64 / self.expected.len() as f64
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.expected.len()
    }

    /// The end of the text was reached at least once since the last reset
    pub fn has_completed(&self) -> bool {
        self.completed
    }

    pub fn reset(&mut self) {
        self.position = 0;
        self.typed.clear();
        self.errors.clear();
        self.completed = false;
    }
}

impl fmt::Debug for InputValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputValidator")
            .field("expected", &self.expected_text())
            .field("position", &self.position)
            .field("typed", &self.typed_text())
            .field("errors", &self.errors)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}
