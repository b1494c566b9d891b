use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::metrics::SessionStats;
use crate::modes::{ModeId, UnknownMode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryParseError {
    #[error("results summary has no mode")]
    MissingMode,
    #[error(transparent)]
    UnknownMode(#[from] UnknownMode),
    #[error("invalid value '{value}' for '{field}'")]
    InvalidNumber { field: &'static str, value: String },
}

/// The four scorecard numbers plus the mode, as shown on the results
/// screen and shared as `mode=..&wpm=..&accuracy=..&time=..&errors=..`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultsSummary {
    pub mode: ModeId,
    pub wpm: u32,
    pub accuracy: u32,
    /// Whole seconds, rounded
    pub time_secs: u64,
    pub errors: usize,
}

impl ResultsSummary {
    pub fn from_stats(mode: ModeId, stats: &SessionStats) -> Self {
        Self {
            mode,
            wpm: stats.wpm,
            accuracy: stats.accuracy,
            time_secs: stats.elapsed_time.max(0.0).round() as u64,
            errors: stats.error_count,
        }
    }

    pub fn to_query(&self) -> String {
        format!(
            "mode={}&wpm={}&accuracy={}&time={}&errors={}",
            self.mode, self.wpm, self.accuracy, self.time_secs, self.errors
        )
    }
}

impl fmt::Display for ResultsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, SummaryParseError> {
    value
        .parse()
        .map_err(|_| SummaryParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Missing numbers read as 0, unknown keys are skipped.
impl FromStr for ResultsSummary {
    type Err = SummaryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let query = s.trim().trim_start_matches('?');

        let mut mode = None;
        let (mut wpm, mut accuracy, mut time_secs, mut errors) = (0u32, 0u32, 0u64, 0usize);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "mode" => mode = Some(value.parse::<ModeId>()?),
                "wpm" => wpm = parse_field("wpm", value)?,
                "accuracy" => accuracy = parse_field("accuracy", value)?,
                "time" => time_secs = parse_field("time", value)?,
                "errors" => errors = parse_field("errors", value)?,
                _ => {}
            }
        }

        Ok(Self {
            mode: mode.ok_or(SummaryParseError::MissingMode)?,
            wpm,
            accuracy,
            time_secs,
            errors,
        })
    }
}
