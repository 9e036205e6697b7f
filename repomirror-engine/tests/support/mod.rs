//! In-memory `RepoInstanceClient` that records every call.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use repomirror_core::{
    ClientError, CreateRemoteRepository, PackageType, RepoInstanceClient, Repository,
    RepositoryId, Workspace, WorkspaceId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListWorkspaces,
    CreateWorkspace(String),
    DeleteWorkspace(String),
    ListRepositories(WorkspaceId),
    CreateRemoteRepository(WorkspaceId, CreateRemoteRepository),
    DeleteRepository(RepositoryId),
}

#[derive(Default)]
struct State {
    workspaces: Vec<Workspace>,
    repositories: HashMap<WorkspaceId, Vec<Repository>>,
    /// Workspace -> number of the listing that first comes back empty.
    drain_after: HashMap<WorkspaceId, u32>,
    polls: HashMap<WorkspaceId, u32>,
    failures: HashSet<String>,
    calls: Vec<Call>,
    next_id: u32,
}

pub struct FakeInstance {
    name: String,
    base_url: String,
    state: Mutex<State>,
}

pub fn repo(id: &str, name: &str, package_type: &str, workspace_id: &str) -> Repository {
    Repository {
        id: RepositoryId::from(id),
        name: name.to_string(),
        package_type: PackageType::from(package_type),
        repository_type: "local".to_string(),
        status: "ready".to_string(),
        workspace_id: WorkspaceId::from(workspace_id),
    }
}

impl FakeInstance {
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_workspace(self, id: &str, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .workspaces
            .push(Workspace::new(id, name));
        self
    }

    pub fn with_repository(self, workspace_id: &str, name: &str, package_type: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = format!("{}-r{}", self.name, state.next_id);
            state
                .repositories
                .entry(WorkspaceId::from(workspace_id))
                .or_default()
                .push(repo(&id, name, package_type, workspace_id));
        }
        self
    }

    /// Repository deletions in `workspace_id` only take effect on listing
    /// number `polls`; `u32::MAX` never drains.
    pub fn drain_after(self, workspace_id: &str, polls: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .drain_after
            .insert(WorkspaceId::from(workspace_id), polls);
        self
    }

    /// Make the operation identified by `key` fail, e.g. `list_workspaces`,
    /// `list_repositories:w1`, `create_workspace:A`, `create_remote:w1`,
    /// `delete_repository:r1`, `delete_workspace:C`.
    pub fn failing(self, key: &str) -> Self {
        self.state.lock().unwrap().failures.insert(key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    pub fn workspace_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .workspaces
            .iter()
            .map(|w| w.name.clone())
            .collect()
    }

    pub fn created_repositories(&self) -> Vec<(WorkspaceId, CreateRemoteRepository)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateRemoteRepository(ws, body) => Some((ws, body)),
                _ => None,
            })
            .collect()
    }

    pub fn is_mutated(&self) -> bool {
        self.calls().iter().any(|call| {
            matches!(
                call,
                Call::CreateWorkspace(_)
                    | Call::DeleteWorkspace(_)
                    | Call::CreateRemoteRepository(..)
                    | Call::DeleteRepository(_)
            )
        })
    }

    fn check(&self, state: &State, key: &str) -> Result<(), ClientError> {
        if state.failures.contains(key) {
            return Err(ClientError::Status {
                instance: self.name.clone(),
                status: 500,
                body: format!("injected failure: {key}"),
            });
        }
        Ok(())
    }
}

impl RepoInstanceClient for FakeInstance {
    fn instance_name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_workspaces(&self) -> Result<Vec<Workspace>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListWorkspaces);
        self.check(&state, "list_workspaces")?;
        Ok(state.workspaces.clone())
    }

    fn create_workspace(&self, name: &str) -> Result<WorkspaceId, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateWorkspace(name.to_string()));
        self.check(&state, &format!("create_workspace:{name}"))?;
        state.next_id += 1;
        let id = WorkspaceId::from(format!("{}-w{}", self.name, state.next_id));
        state.workspaces.push(Workspace {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(id)
    }

    fn delete_workspace(&self, name: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteWorkspace(name.to_string()));
        self.check(&state, &format!("delete_workspace:{name}"))?;
        state.workspaces.retain(|w| w.name != name);
        Ok(())
    }

    fn list_repositories(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Repository>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListRepositories(workspace_id.clone()));
        self.check(&state, &format!("list_repositories:{workspace_id}"))?;

        let poll = {
            let polls = state.polls.entry(workspace_id.clone()).or_default();
            *polls += 1;
            *polls
        };
        if let Some(&drain_after) = state.drain_after.get(workspace_id) {
            if poll >= drain_after {
                state.repositories.remove(workspace_id);
            }
        }
        Ok(state
            .repositories
            .get(workspace_id)
            .cloned()
            .unwrap_or_default())
    }

    fn create_remote_repository(
        &self,
        workspace_id: &WorkspaceId,
        request: &CreateRemoteRepository,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateRemoteRepository(
            workspace_id.clone(),
            request.clone(),
        ));
        self.check(&state, &format!("create_remote:{workspace_id}"))?;
        state.next_id += 1;
        let id = format!("{}-r{}", self.name, state.next_id);
        state
            .repositories
            .entry(workspace_id.clone())
            .or_default()
            .push(repo(&id, &request.name, request.package_type.as_str(), &workspace_id.0));
        Ok(())
    }

    fn delete_repository(&self, repository_id: &RepositoryId) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteRepository(repository_id.clone()));
        self.check(&state, &format!("delete_repository:{repository_id}"))?;

        let State {
            repositories,
            drain_after,
            ..
        } = &mut *state;
        for (workspace_id, repos) in repositories.iter_mut() {
            // Deferred workspaces keep their repositories until drained.
            if drain_after.contains_key(workspace_id) {
                continue;
            }
            repos.retain(|r| &r.id != repository_id);
        }
        Ok(())
    }
}
