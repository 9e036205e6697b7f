//! Read-only preview of what the next cycle would change.

use serde::Serialize;

use repomirror_core::{RepoInstanceClient, Workspace};

use crate::diff::{diff_repositories, diff_workspaces, RepositoryRef, WorkspaceDiff};
use crate::error::SyncError;
use crate::orchestrator::SyncOrchestrator;
use crate::repository::{plan_creations, PlannedRepository};

/// Planned repository changes for one mirrored workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspacePlan {
    pub workspace: String,
    /// False when the workspace itself would be created first.
    pub exists_on_target: bool,
    pub create: Vec<PlannedRepository>,
    pub delete: Vec<RepositoryRef>,
}

/// Planned changes for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetPlan {
    pub instance: String,
    pub workspaces: WorkspaceDiff,
    /// Only workspaces with pending repository changes are listed.
    pub repositories: Vec<WorkspacePlan>,
    pub error: Option<String>,
}

impl TargetPlan {
    pub fn is_noop(&self) -> bool {
        self.error.is_none() && self.workspaces.is_empty() && self.repositories.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CyclePlan {
    pub targets: Vec<TargetPlan>,
}

impl<S, T> SyncOrchestrator<S, T>
where
    S: RepoInstanceClient,
    T: RepoInstanceClient,
{
    /// List the source and every target and compute the diffs a cycle would
    /// apply, without issuing any mutating call.
    ///
    /// Workspaces that do not exist yet are planned against an empty
    /// repository list. Per-target listing errors are recorded in that
    /// target's plan; a failing source listing fails the whole plan.
    pub fn plan_cycle(&self) -> Result<CyclePlan, SyncError> {
        let source_workspaces = self
            .source
            .list_workspaces()
            .map_err(SyncError::SourceUnavailable)?;

        let targets = self
            .targets
            .iter()
            .map(|target| {
                let instance = target.instance_name();
                match self.plan_target(target, &source_workspaces) {
                    Ok(plan) => plan,
                    Err(err) => {
                        tracing::error!(instance, error = %err, "planning target failed");
                        TargetPlan {
                            instance: instance.to_string(),
                            error: Some(err.to_string()),
                            ..TargetPlan::default()
                        }
                    }
                }
            })
            .collect();

        Ok(CyclePlan { targets })
    }

    fn plan_target(
        &self,
        target: &T,
        source_workspaces: &[Workspace],
    ) -> Result<TargetPlan, SyncError> {
        let target_workspaces = target.list_workspaces()?;
        let workspaces = diff_workspaces(source_workspaces, &target_workspaces);
        let prefix = self.settings.repo_name_prefix.as_str();

        let mut repositories = Vec::new();
        for source_workspace in source_workspaces {
            let source_repos = self.source.list_repositories(&source_workspace.id)?;
            let existing = target_workspaces
                .iter()
                .find(|w| w.name == source_workspace.name);
            let target_repos = match existing {
                Some(workspace) => target.list_repositories(&workspace.id)?,
                None => Vec::new(),
            };

            let diff = diff_repositories(&source_repos, &target_repos, prefix);
            if diff.is_empty() {
                continue;
            }
            repositories.push(WorkspacePlan {
                workspace: source_workspace.name.clone(),
                exists_on_target: existing.is_some(),
                create: plan_creations(
                    &diff,
                    &source_repos,
                    self.source.base_url(),
                    &source_workspace.name,
                    prefix,
                ),
                delete: diff.to_delete,
            });
        }

        Ok(TargetPlan {
            instance: target.instance_name().to_string(),
            workspaces,
            repositories,
            error: None,
        })
    }
}
