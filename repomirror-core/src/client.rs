//! The request/response surface the sync engine needs from an instance.

use crate::error::ClientError;
use crate::types::{CreateRemoteRepository, Repository, RepositoryId, Workspace, WorkspaceId};

/// One repository-management instance (the source or a target).
///
/// Calls are blocking. Implementations must be shareable across threads so
/// targets can be reconciled in parallel.
pub trait RepoInstanceClient: Send + Sync {
    /// Human-readable instance name used in logs (`MAIN`, `eu`, ...).
    fn instance_name(&self) -> &str;

    /// Base URL without trailing slash.
    fn base_url(&self) -> &str;

    fn list_workspaces(&self) -> Result<Vec<Workspace>, ClientError>;

    /// Create a workspace and return the id the instance assigned to it.
    fn create_workspace(&self, name: &str) -> Result<WorkspaceId, ClientError>;

    /// Delete a workspace. The server looks it up by name, not id.
    fn delete_workspace(&self, name: &str) -> Result<(), ClientError>;

    fn list_repositories(&self, workspace_id: &WorkspaceId)
        -> Result<Vec<Repository>, ClientError>;

    fn create_remote_repository(
        &self,
        workspace_id: &WorkspaceId,
        request: &CreateRemoteRepository,
    ) -> Result<(), ClientError>;

    /// Submit a background deletion task. Completion is not awaited.
    fn delete_repository(&self, repository_id: &RepositoryId) -> Result<(), ClientError>;
}

impl<T: RepoInstanceClient + ?Sized> RepoInstanceClient for Box<T> {
    fn instance_name(&self) -> &str {
        (**self).instance_name()
    }

    fn base_url(&self) -> &str {
        (**self).base_url()
    }

    fn list_workspaces(&self) -> Result<Vec<Workspace>, ClientError> {
        (**self).list_workspaces()
    }

    fn create_workspace(&self, name: &str) -> Result<WorkspaceId, ClientError> {
        (**self).create_workspace(name)
    }

    fn delete_workspace(&self, name: &str) -> Result<(), ClientError> {
        (**self).delete_workspace(name)
    }

    fn list_repositories(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Repository>, ClientError> {
        (**self).list_repositories(workspace_id)
    }

    fn create_remote_repository(
        &self,
        workspace_id: &WorkspaceId,
        request: &CreateRemoteRepository,
    ) -> Result<(), ClientError> {
        (**self).create_remote_repository(workspace_id, request)
    }

    fn delete_repository(&self, repository_id: &RepositoryId) -> Result<(), ClientError> {
        (**self).delete_repository(repository_id)
    }
}
