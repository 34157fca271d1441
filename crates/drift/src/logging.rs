//! File logging.
//!
//! The terminal belongs to the animation, so events go to
//! `<data_local_dir>/drift/drift.log`. The filter is read from `DRIFT_LOG`
//! and defaults to `warn`.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "DRIFT_LOG";

const LOG_FILE: &str = "drift.log";

fn log_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "drift").map(|dirs| dirs.data_local_dir().join(LOG_FILE))
}

/// Install the global subscriber. Logging stays disabled if the log file
/// cannot be opened.
pub fn init() {
    let Some(path) = log_path() else {
        return;
    };
    if let Some(dir) = path.parent()
        && fs::create_dir_all(dir).is_err()
    {
        return;
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
