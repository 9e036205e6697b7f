//! Repository reconciliation within one source/target workspace pair.

use serde::Serialize;

use repomirror_core::{
    CreateRemoteRepository, Credentials, PackageType, RepoInstanceClient, Repository,
    SyncSettings, Workspace,
};

use crate::diff::{diff_repositories, RepositoryDiff};
use crate::error::SyncError;

/// Upstream URL a remote-proxy repository on a target points at.
///
/// Docker registries are addressed without the package-type segment;
/// universal repositories carry literal `{package-name}/{version}/{file}`
/// placeholders for the target to fill in.
pub fn remote_url(
    source_base_url: &str,
    workspace_name: &str,
    original_name: &str,
    package_type: &PackageType,
) -> String {
    if package_type.is_docker() {
        format!("{source_base_url}/{workspace_name}/{original_name}")
    } else if package_type.is_universal() {
        format!(
            "{source_base_url}/{package_type}/{workspace_name}/{original_name}/{{package-name}}/{{version}}/{{file}}"
        )
    } else {
        format!("{source_base_url}/{package_type}/{workspace_name}/{original_name}")
    }
}

/// Recover the source repository name from a prefixed target name.
pub fn strip_prefix<'a>(name: &'a str, prefix: &str) -> &'a str {
    name.strip_prefix(prefix).unwrap_or(name)
}

/// One remote-proxy repository that should exist on a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRepository {
    /// Prefixed name used on the target.
    pub name: String,
    pub original_name: String,
    pub package_type: PackageType,
    pub remote_url: String,
}

/// Resolve each name in `diff.to_create` back to its source repository and
/// derive the remote URL. Names with no source match are skipped.
pub fn plan_creations(
    diff: &RepositoryDiff,
    source_repos: &[Repository],
    source_base_url: &str,
    workspace_name: &str,
    prefix: &str,
) -> Vec<PlannedRepository> {
    diff.to_create
        .iter()
        .filter_map(|name| {
            let original = strip_prefix(name, prefix);
            let repo = source_repos.iter().find(|r| r.name == original)?;
            Some(PlannedRepository {
                name: name.clone(),
                original_name: original.to_string(),
                package_type: repo.package_type.clone(),
                remote_url: remote_url(source_base_url, workspace_name, original, &repo.package_type),
            })
        })
        .collect()
}

/// Counts of what one `sync_repositories` call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositorySyncReport {
    pub created: Vec<String>,
    pub deleted: Vec<String>,
}

/// Mirrors the repositories of source workspaces onto a target as
/// remote-proxy repositories.
pub struct RepositoryReconciler<'a, S: ?Sized, T: ?Sized> {
    source: &'a S,
    target: &'a T,
    upstream: &'a Credentials,
    settings: &'a SyncSettings,
}

impl<'a, S, T> RepositoryReconciler<'a, S, T>
where
    S: RepoInstanceClient + ?Sized,
    T: RepoInstanceClient + ?Sized,
{
    /// `upstream` are the source instance's own credentials, forwarded so the
    /// target can authenticate when proxying.
    pub fn new(
        source: &'a S,
        target: &'a T,
        upstream: &'a Credentials,
        settings: &'a SyncSettings,
    ) -> Self {
        Self {
            source,
            target,
            upstream,
            settings,
        }
    }

    pub fn sync_repositories(
        &self,
        source_workspace: &Workspace,
        target_workspace: &Workspace,
    ) -> Result<RepositorySyncReport, SyncError> {
        let source_repos = self.source.list_repositories(&source_workspace.id)?;
        let target_repos = self.target.list_repositories(&target_workspace.id)?;
        let prefix = self.settings.repo_name_prefix.as_str();

        let diff = diff_repositories(&source_repos, &target_repos, prefix);
        if diff.is_empty() {
            tracing::debug!(
                instance = self.target.instance_name(),
                workspace = %source_workspace.name,
                "repositories already in sync",
            );
            return Ok(RepositorySyncReport::default());
        }

        let mut report = RepositorySyncReport::default();

        let planned = plan_creations(
            &diff,
            &source_repos,
            self.source.base_url(),
            &source_workspace.name,
            prefix,
        );
        for repo in planned {
            tracing::info!(
                instance = self.target.instance_name(),
                workspace = %source_workspace.name,
                repository = %repo.name,
                remote_url = %repo.remote_url,
                "creating remote repository",
            );
            let request = CreateRemoteRepository::new(
                &repo.name,
                repo.package_type.clone(),
                &repo.remote_url,
                self.upstream,
            );
            self.target
                .create_remote_repository(&target_workspace.id, &request)?;
            report.created.push(repo.name);
        }

        for repo in &diff.to_delete {
            tracing::info!(
                instance = self.target.instance_name(),
                workspace = %target_workspace.name,
                repository = %repo.name,
                id = %repo.id,
                "deleting repository",
            );
            self.target.delete_repository(&repo.id)?;
            report.deleted.push(repo.name.clone());
        }

        Ok(report)
    }
}
