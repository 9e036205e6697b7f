//! Error types for repomirror-engine.

use thiserror::Error;

use repomirror_core::ClientError;

/// All errors that can arise while reconciling a target.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A call against a target (or a per-workspace source listing) failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The source workspace listing failed; nothing can be reconciled.
    #[error("source instance unavailable: {0}")]
    SourceUnavailable(#[source] ClientError),

    /// A workspace expected on a target could not be resolved by name.
    #[error("no workspace named '{name}' on {instance}")]
    WorkspaceNotFound { instance: String, name: String },
}
