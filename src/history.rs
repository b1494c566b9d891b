use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::metrics::SessionStats;
use crate::modes::ModeId;

/// Number of sessions shown on the history screen
pub const RECENT_RESULTS_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("history i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("history export error: {0}")]
    Csv(#[from] csv::Error),
}

/// A completed session as stored in history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResult {
    pub mode: ModeId,
    pub final_wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub time_seconds: f64,
    pub character_count: usize,
    pub error_count: usize,
    pub fastest_burst: u32,
    pub consistency: u32,
    pub timestamp: DateTime<Local>,
}

impl SessionResult {
    pub fn from_stats(mode: ModeId, stats: &SessionStats, timestamp: DateTime<Local>) -> Self {
        Self {
            mode,
            final_wpm: stats.wpm,
            raw_wpm: stats.raw_wpm,
            accuracy: stats.accuracy,
            time_seconds: stats.elapsed_time,
            character_count: stats.total_chars,
            error_count: stats.error_count,
            fastest_burst: stats.fastest_burst,
            consistency: stats.consistency,
            timestamp,
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mode_str: String = row.get(0)?;
        let mode = mode_str.parse::<ModeId>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let timestamp_str: String = row.get(9)?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    9,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .with_timezone(&Local);

        Ok(Self {
            mode,
            final_wpm: row.get(1)?,
            raw_wpm: row.get(2)?,
            accuracy: row.get(3)?,
            time_seconds: row.get(4)?,
            character_count: row.get::<_, i64>(5)? as usize,
            error_count: row.get::<_, i64>(6)? as usize,
            fastest_burst: row.get(7)?,
            consistency: row.get(8)?,
            timestamp,
        })
    }
}

/// Aggregates over a list of results, as shown above the history table
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub average_wpm: u32,
    pub average_accuracy: u32,
    pub best_wpm: u32,
    pub total_time_seconds: f64,
}

impl HistorySummary {
    /// All zeros for an empty list
    pub fn from_results(results: &[SessionResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let n = results.len() as f64;
        let wpm_sum: u64 = results.iter().map(|r| u64::from(r.final_wpm)).sum();
        let accuracy_sum: u64 = results.iter().map(|r| u64::from(r.accuracy)).sum();

        Self {
            sessions: results.len(),
            average_wpm: (wpm_sum as f64 / n).round() as u32,
            average_accuracy: (accuracy_sum as f64 / n).round() as u32,
            best_wpm: results.iter().map(|r| r.final_wpm).max().unwrap_or(0),
            total_time_seconds: results.iter().map(|r| r.time_seconds).sum(),
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT mode, final_wpm, raw_wpm, accuracy, time_seconds, \
     character_count, error_count, fastest_burst, consistency, timestamp \
     FROM session_results";

/// Persistent log of completed sessions
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the history database at the default state location
    pub fn open_default() -> Result<Self, HistoryError> {
        let path = AppDirs::history_db_path().unwrap_or_else(|| PathBuf::from("typlax_history.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened history database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS session_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mode TEXT NOT NULL,
                final_wpm INTEGER NOT NULL,
                raw_wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                time_seconds REAL NOT NULL,
                character_count INTEGER NOT NULL,
                error_count INTEGER NOT NULL,
                fastest_burst INTEGER NOT NULL,
                consistency INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_session_results_mode ON session_results(mode)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Stores a result, returns its row id
    pub fn record(&self, result: &SessionResult) -> Result<i64, HistoryError> {
        self.conn.execute(
            r#"
            INSERT INTO session_results
            (mode, final_wpm, raw_wpm, accuracy, time_seconds, character_count,
             error_count, fastest_burst, consistency, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                result.mode.to_string(),
                result.final_wpm,
                result.raw_wpm,
                result.accuracy,
                result.time_seconds,
                result.character_count as i64,
                result.error_count as i64,
                result.fastest_burst,
                result.consistency,
                result.timestamp.to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, mode = %result.mode, wpm = result.final_wpm, "recorded session result");
        Ok(id)
    }

    /// Overwrites a stored result, e.g. after the player corrected errors
    /// on a finished session
    pub fn replace(&self, id: i64, result: &SessionResult) -> Result<(), HistoryError> {
        self.conn.execute(
            r#"
            UPDATE session_results
            SET mode = ?2, final_wpm = ?3, raw_wpm = ?4, accuracy = ?5, time_seconds = ?6,
                character_count = ?7, error_count = ?8, fastest_burst = ?9,
                consistency = ?10, timestamp = ?11
            WHERE id = ?1
            "#,
            params![
                id,
                result.mode.to_string(),
                result.final_wpm,
                result.raw_wpm,
                result.accuracy,
                result.time_seconds,
                result.character_count as i64,
                result.error_count as i64,
                result.fastest_burst,
                result.consistency,
                result.timestamp.to_rfc3339(),
            ],
        )?;

        debug!(id, accuracy = result.accuracy, "replaced session result");
        Ok(())
    }

    /// Most recent sessions first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionResult>, HistoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?1"))?;
        let rows = stmt.query_map([limit as i64], SessionResult::from_row)?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every session, oldest first
    pub fn all(&self) -> Result<Vec<SessionResult>, HistoryError> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))?;
        let rows = stmt.query_map([], SessionResult::from_row)?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn best_wpm(&self, mode: ModeId) -> Result<Option<u32>, HistoryError> {
        let best = self.conn.query_row(
            "SELECT MAX(final_wpm) FROM session_results WHERE mode = ?1",
            [mode.to_string()],
            |row| row.get::<_, Option<u32>>(0),
        )?;
        Ok(best)
    }

    pub fn count(&self) -> Result<usize, HistoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM session_results", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        self.conn.execute("DELETE FROM session_results", [])?;
        info!("cleared session history");
        Ok(())
    }

    /// Writes every session as CSV with a header row, returns the number of
    /// sessions written
    pub fn export_csv<W: io::Write>(&self, writer: W) -> Result<usize, HistoryError> {
        let results = self.all()?;
        let mut wtr = csv::Writer::from_writer(writer);
        for result in &results {
            wtr.serialize(result)?;
        }
        if results.is_empty() {
            wtr.write_record([
                "mode",
                "final_wpm",
                "raw_wpm",
                "accuracy",
                "time_seconds",
                "character_count",
                "error_count",
                "fastest_burst",
                "consistency",
                "timestamp",
            ])?;
        }
        wtr.flush()?;
        Ok(results.len())
    }
}
