use std::sync::mpsc::{self, Receiver};

use chrono::Local;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::history::SessionResult;
use crate::input::{InputValidator, KeyPress};
use crate::metrics::{MetricsEngine, SessionStats};
use crate::milestones::MilestoneTracker;
use crate::modes::ModeId;
use crate::results::ResultsSummary;

/// What the validator reported through its callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    CharacterTyped {
        character: char,
        is_correct: bool,
        position: usize,
    },
    Completed,
}

/// Result of forwarding one key press to a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// The validator took the key (typed or deleted)
    pub handled: bool,
    /// Character typed by this key and whether it matched
    pub typed: Option<(char, bool)>,
    /// Progress milestone newly reached
    pub milestone: Option<u8>,
    /// This key finished the text for the first time
    pub completed: bool,
    /// This key filled the last slot of the text, first time or after a
    /// correction
    pub finished: bool,
}

/// One play-through of a passage: the host side that owns an
/// [`InputValidator`] and a [`MetricsEngine`] and connects them.
///
/// The validator's callbacks only push [`SessionEvent`]s into a channel;
/// the session drains it after each key and feeds the metrics engine. The
/// two components never see each other.
///
/// Stats are frozen whenever the whole text is typed. A backspace after
/// that reopens the session for corrections; retyping the last slot
/// freezes the corrected stats again.
#[derive(Debug)]
pub struct PlaySession<C: Clock = SystemClock> {
    mode: ModeId,
    validator: InputValidator,
    metrics: MetricsEngine<C>,
    events: Receiver<SessionEvent>,
    milestones: MilestoneTracker,
    final_stats: Option<SessionStats>,
}

impl PlaySession<SystemClock> {
    pub fn new(mode: ModeId, text: &str) -> Self {
        Self::with_clock(mode, text, SystemClock::new())
    }
}

impl<C: Clock> PlaySession<C> {
    pub fn with_clock(mode: ModeId, text: &str, clock: C) -> Self {
        let (tx, events) = mpsc::channel();
        let typed_tx = tx.clone();

        let validator = InputValidator::new(
            text,
            move |character, is_correct, position| {
                let _ = typed_tx.send(SessionEvent::CharacterTyped {
                    character,
                    is_correct,
                    position,
                });
            },
            move || {
                let _ = tx.send(SessionEvent::Completed);
            },
        );

        Self {
            mode,
            validator,
            metrics: MetricsEngine::with_clock(clock),
            events,
            milestones: MilestoneTracker::new(),
            final_stats: None,
        }
    }

    /// Forwards a key press to the validator and feeds the metrics engine
    /// with what it reports
    pub fn handle_key(&mut self, key: &KeyPress) -> KeyOutcome {
        let mut outcome = KeyOutcome {
            handled: self.validator.handle_key_event(key),
            ..KeyOutcome::default()
        };

        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::CharacterTyped {
                    character,
                    is_correct,
                    position,
                } => {
                    if !self.metrics.has_started() {
                        info!(mode = %self.mode, "session started");
                    }
                    debug!(%character, is_correct, position, "keystroke");
                    self.metrics.record_keystroke(character, is_correct);
                    outcome.typed = Some((character, is_correct));
                }
                SessionEvent::Completed => {
                    let stats = self.metrics.get_stats();
                    info!(
                        mode = %self.mode,
                        wpm = stats.wpm,
                        accuracy = stats.accuracy,
                        errors = stats.error_count,
                        "session complete"
                    );
                    outcome.completed = true;
                }
            }
        }

        if !outcome.handled {
            return outcome;
        }

        outcome.milestone = self.milestones.check(self.validator.progress());

        if !self.validator.is_complete() {
            self.final_stats = None;
        } else if outcome.typed.is_some() {
            let stats = self.metrics.get_stats();
            if !outcome.completed {
                debug!(
                    accuracy = stats.accuracy,
                    errors = stats.error_count,
                    "session finished again after corrections"
                );
            }
            self.final_stats = Some(stats);
            outcome.finished = true;
        }

        outcome
    }

    /// Live stats for the HUD; frozen once the session is complete
    pub fn poll(&self) -> SessionStats {
        self.final_stats.unwrap_or_else(|| self.metrics.get_stats())
    }

    /// Stats captured when the text was last filled. None while the
    /// session is open. A session over an empty text is complete from the
    /// start and reports the engine's initial stats.
    pub fn final_stats(&self) -> Option<SessionStats> {
        self.final_stats
            .or_else(|| self.validator.is_complete().then(|| self.metrics.get_stats()))
    }

    pub fn scorecard(&self) -> Option<SessionResult> {
        self.final_stats()
            .map(|stats| SessionResult::from_stats(self.mode, &stats, Local::now()))
    }

    pub fn summary(&self) -> Option<ResultsSummary> {
        self.final_stats()
            .map(|stats| ResultsSummary::from_stats(self.mode, &stats))
    }

    pub fn reset(&mut self) {
        self.validator.reset();
        self.metrics.reset();
        self.milestones.reset();
        self.final_stats = None;
        while self.events.try_recv().is_ok() {}
        info!(mode = %self.mode, "session reset");
    }

    pub fn mode(&self) -> ModeId {
        self.mode
    }

    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }

    pub fn metrics(&self) -> &MetricsEngine<C> {
        &self.metrics
    }

    pub fn has_started(&self) -> bool {
        self.metrics.has_started()
    }

    pub fn is_complete(&self) -> bool {
        self.validator.is_complete()
    }

    /// The text was filled at least once since the last reset
    pub fn has_completed(&self) -> bool {
        self.validator.has_completed()
    }

    pub fn progress(&self) -> f64 {
        self.validator.progress()
    }
}
