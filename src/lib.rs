// Engine and host services, shared by the binary and the integration tests.
// Nothing here depends on the terminal front end in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod history;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod milestones;
pub mod modes;
pub mod results;
pub mod runtime;
pub mod session;
pub mod util;
