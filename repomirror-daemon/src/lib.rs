//! Long-running side of repomirror: periodic sync scheduler, signal handling,
//! logging setup and size-capped log files.

mod error;
pub mod log_rotation;
pub mod logging;
pub mod paths;
mod runtime;
pub mod version;

pub use error::DaemonError;
pub use logging::init_tracing;
pub use runtime::{build_orchestrator, run, run_scheduler, start_blocking, HttpOrchestrator};
pub use version::version;
