use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::Level;

pub const PRODUCT_NAME: &str = "repomirror";

/// Read from the working directory at startup.
pub const VERSION_FILE: &str = "repoflow-version.txt";

/// Every event, whatever its level.
pub const COMBINED_LOG: &str = "combined.log";

/// One file per level, each holding only events of exactly that level.
pub const LEVEL_LOGS: [(Level, &str); 5] = [
    (Level::ERROR, "error.log"),
    (Level::WARN, "warn.log"),
    (Level::INFO, "info.log"),
    (Level::DEBUG, "debug.log"),
    (Level::TRACE, "verbose.log"),
];

/// How long an in-flight cycle may keep running after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub fn combined_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(COMBINED_LOG)
}
