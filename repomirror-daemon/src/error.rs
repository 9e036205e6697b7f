use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error surface for the scheduler, logging setup and client wiring.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] repomirror_core::ConfigError),

    #[error("client error: {0}")]
    Client(#[from] repomirror_core::ClientError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },

    #[error("in-flight sync cycle did not finish within {grace:?} of shutdown")]
    ShutdownTimeout { grace: Duration },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
