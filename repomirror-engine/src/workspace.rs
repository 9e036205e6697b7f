//! Workspace reconciliation against one target.
//!
//! Creations are applied to the caller's local view of the target's
//! workspaces so repository reconciliation can resolve new ids in the same
//! cycle. Deletions go through [`WorkspaceReconciler::delete_workspace_with_drain`]
//! and are only visible in the next cycle's listing.

use std::thread;

use serde::Serialize;

use repomirror_core::{RepoInstanceClient, SyncSettings, Workspace};

use crate::diff::diff_workspaces;
use crate::error::SyncError;

/// Terminal state of a drain-then-delete attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DrainOutcome {
    /// The workspace was empty on poll `attempts` and has been deleted.
    Deleted { attempts: u32 },
    /// Repositories were still present after the last poll; the workspace is
    /// left for the next cycle.
    Abandoned { attempts: u32, remaining: usize },
}

/// Result of reconciling the workspace set of one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSync {
    /// Target workspaces as listed, plus every workspace created this call.
    pub workspaces: Vec<Workspace>,
    pub created: Vec<String>,
    pub deletions: Vec<(String, DrainOutcome)>,
}

pub struct WorkspaceReconciler<'a, T: ?Sized> {
    target: &'a T,
    settings: &'a SyncSettings,
}

impl<'a, T> WorkspaceReconciler<'a, T>
where
    T: RepoInstanceClient + ?Sized,
{
    pub fn new(target: &'a T, settings: &'a SyncSettings) -> Self {
        Self { target, settings }
    }

    /// Create missing workspaces and drain-delete extraneous ones.
    pub fn sync_workspaces(
        &self,
        source_workspaces: &[Workspace],
        target_workspaces: Vec<Workspace>,
    ) -> Result<WorkspaceSync, SyncError> {
        let diff = diff_workspaces(source_workspaces, &target_workspaces);
        let mut result = WorkspaceSync {
            workspaces: target_workspaces,
            ..WorkspaceSync::default()
        };

        for workspace in &diff.to_create {
            let id = self.target.create_workspace(&workspace.name)?;
            tracing::info!(
                instance = self.target.instance_name(),
                workspace = %workspace.name,
                id = %id,
                "created workspace",
            );
            result.workspaces.push(Workspace {
                id,
                name: workspace.name.clone(),
            });
            result.created.push(workspace.name.clone());
        }

        for workspace in &diff.to_delete {
            let outcome = self.delete_workspace_with_drain(workspace)?;
            result.deletions.push((workspace.name.clone(), outcome));
        }

        Ok(result)
    }

    /// Delete every repository in `workspace`, wait for the instance's
    /// background tasks to drain them, then delete the workspace itself.
    ///
    /// Polls at most `drain_max_attempts` times with a fixed
    /// `drain_retry_delay` between polls. Exhausting the budget is not an
    /// error: a warning is logged and [`DrainOutcome::Abandoned`] returned.
    /// A failing delete call aborts the whole attempt.
    pub fn delete_workspace_with_drain(
        &self,
        workspace: &Workspace,
    ) -> Result<DrainOutcome, SyncError> {
        let instance = self.target.instance_name();
        let max_attempts = self.settings.drain_max_attempts;
        tracing::info!(instance, workspace = %workspace.name, "deleting workspace");

        let mut remaining = 0;
        for attempt in 1..=max_attempts {
            let repos = self.target.list_repositories(&workspace.id)?;

            if repos.is_empty() {
                self.target.delete_workspace(&workspace.name)?;
                tracing::info!(instance, workspace = %workspace.name, attempt, "deleted workspace");
                return Ok(DrainOutcome::Deleted { attempts: attempt });
            }

            remaining = repos.len();
            tracing::info!(
                instance,
                workspace = %workspace.name,
                repositories = remaining,
                attempt,
                max_attempts,
                "workspace still has repositories, deleting them",
            );
            for repo in &repos {
                tracing::debug!(instance, workspace = %workspace.name, repository = %repo.name, id = %repo.id, "deleting repository");
                self.target.delete_repository(&repo.id)?;
            }

            if !self.settings.drain_retry_delay.is_zero() {
                tracing::debug!(
                    delay_ms = self.settings.drain_retry_delay.as_millis() as u64,
                    "waiting for repository deletions to complete",
                );
                thread::sleep(self.settings.drain_retry_delay);
            }
        }

        tracing::warn!(
            instance,
            workspace = %workspace.name,
            remaining,
            attempts = max_attempts,
            "workspace still has repositories after all drain attempts, skipping delete",
        );
        Ok(DrainOutcome::Abandoned {
            attempts: max_attempts,
            remaining,
        })
    }
}
