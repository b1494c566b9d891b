//! File-backed tracing setup. The terminal belongs to the UI, so log lines
//! go to a file in the state directory.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `TYPLAX_LOG=debug`
pub const LOG_ENV: &str = "TYPLAX_LOG";

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber appending to `path`. Fails if a
/// subscriber is already installed or the file cannot be opened.
pub fn init_file_logging(path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
}
