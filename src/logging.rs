//! Logging initialization for the console binary.
//!
//! Interactive sessions log to a file so diagnostics do not interleave with
//! results; script runs log to stderr by default.

use crate::config::APP_DIR;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to `path`, truncating it on each start.
///
/// Falls back to no logging if the file cannot be created.
pub fn init_file_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return;
        }
    }

    let log_file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the default log file path.
///
/// Uses the XDG state directory on Linux (`~/.local/state/graph-console/gconsole.log`),
/// falling back to the config directory, then the temp directory.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join(APP_DIR).join("gconsole.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join(APP_DIR).join("gconsole.log");
    }

    std::env::temp_dir().join("gconsole.log")
}
