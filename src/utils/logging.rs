//! Diagnostic logging.
//!
//! The TUI owns the terminal, so diagnostics only go to a file named on the
//! command line. Without one, no subscriber is installed and `tracing`
//! macros are no-ops.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "TETHER_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Filter from `TETHER_LOG`, falling back to `info` when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs a global subscriber appending to `log_file`. Returns whether a
/// subscriber was installed.
pub fn init(log_file: Option<&Path>) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(path) = log_file else {
        return Ok(false);
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| err.to_string())?;
    Ok(true)
}
