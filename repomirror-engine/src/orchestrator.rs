//! One full sync cycle: source listing, then every target in turn.
//!
//! Each target runs behind its own error boundary, and inside a target each
//! workspace's repository reconciliation has its own boundary, so one
//! failure never stops unrelated work.

use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use repomirror_core::{Credentials, RepoInstanceClient, SyncSettings, Workspace};

use crate::error::SyncError;
use crate::repository::RepositoryReconciler;
use crate::workspace::{DrainOutcome, WorkspaceReconciler};

/// A workspace whose repository reconciliation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceFailure {
    pub workspace: String,
    pub error: String,
}

/// What happened on one target during a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub instance: String,
    pub workspaces_created: Vec<String>,
    pub workspaces_deleted: Vec<String>,
    pub workspaces_abandoned: Vec<String>,
    pub repositories_created: usize,
    pub repositories_deleted: usize,
    pub workspace_failures: Vec<WorkspaceFailure>,
    /// Set when the target was abandoned part-way.
    pub error: Option<String>,
}

impl TargetReport {
    fn new(instance: &str) -> Self {
        Self {
            instance: instance.to_string(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.workspace_failures.is_empty()
    }
}

/// Outcome of [`SyncOrchestrator::run_cycle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    /// Set when the source listing failed; no target was touched.
    pub source_error: Option<String>,
    pub targets: Vec<TargetReport>,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.source_error.is_none() && self.targets.iter().all(TargetReport::is_success)
    }

    pub fn failed_targets(&self) -> usize {
        self.targets.iter().filter(|t| !t.is_success()).count()
    }
}

/// Reconciles every target against the source.
///
/// Holds no state between cycles: every call of [`Self::run_cycle`] starts
/// from fresh listings, so it can be invoked repeatedly.
pub struct SyncOrchestrator<S, T> {
    pub(crate) source: S,
    pub(crate) upstream: Credentials,
    pub(crate) targets: Vec<T>,
    pub(crate) settings: SyncSettings,
}

impl<S, T> SyncOrchestrator<S, T>
where
    S: RepoInstanceClient,
    T: RepoInstanceClient,
{
    /// `upstream` are the source's credentials, forwarded to created
    /// remote repositories.
    pub fn new(source: S, upstream: Credentials, targets: Vec<T>, settings: SyncSettings) -> Self {
        Self {
            source,
            upstream,
            targets,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn targets(&self) -> &[T] {
        &self.targets
    }

    pub fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let started = Instant::now();
        tracing::info!(targets = self.targets.len(), "starting sync cycle");

        let source_workspaces = match self.source.list_workspaces() {
            Ok(workspaces) => workspaces,
            Err(err) => {
                let err = SyncError::SourceUnavailable(err);
                tracing::error!(instance = self.source.instance_name(), error = %err, "sync cycle aborted");
                return CycleReport {
                    started_at,
                    duration_ms: started.elapsed().as_millis(),
                    source_error: Some(err.to_string()),
                    targets: Vec::new(),
                };
            }
        };

        let targets = if self.settings.parallel_targets && self.targets.len() > 1 {
            self.sync_targets_parallel(&source_workspaces)
        } else {
            self.targets
                .iter()
                .map(|target| self.sync_target(target, &source_workspaces))
                .collect()
        };

        let report = CycleReport {
            started_at,
            duration_ms: started.elapsed().as_millis(),
            source_error: None,
            targets,
        };
        tracing::info!(
            targets = report.targets.len(),
            failed = report.failed_targets(),
            duration_ms = report.duration_ms as u64,
            "sync cycle complete",
        );
        report
    }

    fn sync_targets_parallel(&self, source_workspaces: &[Workspace]) -> Vec<TargetReport> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .targets
                .iter()
                .map(|target| {
                    (
                        target.instance_name(),
                        scope.spawn(move || self.sync_target(target, source_workspaces)),
                    )
                })
                .collect();

            handles
                .into_iter()
                .map(|(instance, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::error!(instance, "target reconciliation thread panicked");
                        TargetReport {
                            error: Some("reconciliation thread panicked".to_string()),
                            ..TargetReport::new(instance)
                        }
                    })
                })
                .collect()
        })
    }

    /// Error boundary for one target.
    fn sync_target(&self, target: &T, source_workspaces: &[Workspace]) -> TargetReport {
        let instance = target.instance_name();
        tracing::info!(instance, "syncing target instance");

        let mut report = TargetReport::new(instance);
        if let Err(err) = self.reconcile_target(target, source_workspaces, &mut report) {
            tracing::error!(instance, error = %err, "target sync failed, moving on");
            report.error = Some(err.to_string());
        }
        report
    }

    fn reconcile_target(
        &self,
        target: &T,
        source_workspaces: &[Workspace],
        report: &mut TargetReport,
    ) -> Result<(), SyncError> {
        let instance = target.instance_name();
        let target_workspaces = target.list_workspaces()?;

        let workspaces = WorkspaceReconciler::new(target, &self.settings)
            .sync_workspaces(source_workspaces, target_workspaces)?;
        report.workspaces_created = workspaces.created;
        for (name, outcome) in workspaces.deletions {
            match outcome {
                DrainOutcome::Deleted { .. } => report.workspaces_deleted.push(name),
                DrainOutcome::Abandoned { .. } => report.workspaces_abandoned.push(name),
            }
        }

        settle(self.settings.settle_delay);

        let repositories =
            RepositoryReconciler::new(&self.source, target, &self.upstream, &self.settings);
        for source_workspace in source_workspaces {
            let Some(target_workspace) = workspaces
                .workspaces
                .iter()
                .find(|w| w.name == source_workspace.name)
            else {
                let err = SyncError::WorkspaceNotFound {
                    instance: instance.to_string(),
                    name: source_workspace.name.clone(),
                };
                tracing::error!(instance, workspace = %source_workspace.name, error = %err, "target workspace missing after workspace sync, skipping");
                report.workspace_failures.push(WorkspaceFailure {
                    workspace: source_workspace.name.clone(),
                    error: err.to_string(),
                });
                continue;
            };

            match repositories.sync_repositories(source_workspace, target_workspace) {
                Ok(synced) => {
                    report.repositories_created += synced.created.len();
                    report.repositories_deleted += synced.deleted.len();
                }
                Err(err) => {
                    tracing::error!(instance, workspace = %source_workspace.name, error = %err, "repository sync failed");
                    report.workspace_failures.push(WorkspaceFailure {
                        workspace: source_workspace.name.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
