use ratatui::Frame;

use crate::{
    ui::{render_history, render_results, render_typing},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Passage, HUD and optional keyboard
pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_typing(app, f.area(), f.buffer_mut());
    }
}

/// Scorecard and WPM chart of the finished session
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_results(app, f.area(), f.buffer_mut());
    }
}

pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_history(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Typing => Box::new(TypingScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::History => Box::new(HistoryScreen),
    }
}
