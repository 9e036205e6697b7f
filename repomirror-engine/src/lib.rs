//! # repomirror-engine
//!
//! Reconciliation engine: name-based diffing, workspace and repository
//! reconcilers, and the cycle orchestrator.
//!
//! Build a [`SyncOrchestrator`] from a source client, the source's
//! credentials and the target clients, then call
//! [`SyncOrchestrator::run_cycle`] once per period, or
//! [`SyncOrchestrator::plan_cycle`] for a read-only preview.

pub mod diff;
pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod repository;
pub mod workspace;

pub use diff::{diff_repositories, diff_workspaces, RepositoryDiff, RepositoryRef, WorkspaceDiff};
pub use error::SyncError;
pub use orchestrator::{CycleReport, SyncOrchestrator, TargetReport, WorkspaceFailure};
pub use plan::{CyclePlan, TargetPlan, WorkspacePlan};
pub use repository::{
    remote_url, strip_prefix, PlannedRepository, RepositoryReconciler, RepositorySyncReport,
};
pub use workspace::{DrainOutcome, WorkspaceReconciler, WorkspaceSync};
