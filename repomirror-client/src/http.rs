//! HTTP client for one repository-management instance.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use repomirror_core::{
    ClientError, CreateRemoteRepository, Credentials, InstanceConfig, ManualTaskStart,
    RepoInstanceClient, Repository, RepositoryId, Workspace, WorkspaceId,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWorkspaceResponse {
    workspace_id: WorkspaceId,
}

/// Blocking JSON-over-HTTP client with basic auth and a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpInstanceClient {
    agent: ureq::Agent,
    name: String,
    base_url: String,
    authorization: Option<String>,
}

impl HttpInstanceClient {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let name = name.into();
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Transport {
                message: format!("missing base URL for instance {name}"),
                instance: name,
            });
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("repomirror/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            agent,
            name,
            base_url,
            authorization: basic_auth(credentials),
        })
    }

    pub fn from_config(config: &InstanceConfig, timeout: Duration) -> Result<Self, ClientError> {
        Self::new(&config.name, &config.url, &config.credentials, timeout)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .agent
            .request(method, &url)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json");
        match &self.authorization {
            Some(header) => request.set("Authorization", header),
            None => request,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .request("GET", path)
            .call()
            .map_err(|err| self.map_err(err))?;
        self.decode(response)
    }

    fn send<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: &B,
    ) -> Result<ureq::Response, ClientError> {
        self.request(method, path)
            .send_json(body)
            .map_err(|err| self.map_err(err))
    }

    fn decode<T: DeserializeOwned>(&self, response: ureq::Response) -> Result<T, ClientError> {
        response.into_json::<T>().map_err(|err| ClientError::Decode {
            instance: self.name.clone(),
            message: err.to_string(),
        })
    }

    fn map_err(&self, err: ureq::Error) -> ClientError {
        match err {
            ureq::Error::Status(409, response) => ClientError::Conflict {
                instance: self.name.clone(),
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Status(status, response) => ClientError::Status {
                instance: self.name.clone(),
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => ClientError::Transport {
                instance: self.name.clone(),
                message: transport.to_string(),
            },
        }
    }
}

fn basic_auth(credentials: &Credentials) -> Option<String> {
    if credentials.username.is_empty() && credentials.password.is_empty() {
        return None;
    }
    let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.password));
    Some(format!("Basic {token}"))
}

impl RepoInstanceClient for HttpInstanceClient {
    fn instance_name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_workspaces(&self) -> Result<Vec<Workspace>, ClientError> {
        self.get_json("/workspace")
    }

    fn create_workspace(&self, name: &str) -> Result<WorkspaceId, ClientError> {
        let response = self.send("POST", "/workspace", &json!({ "name": name }))?;
        let created: CreateWorkspaceResponse = self.decode(response)?;
        tracing::info!(instance = %self.name, workspace = name, id = %created.workspace_id, "created workspace");
        Ok(created.workspace_id)
    }

    fn delete_workspace(&self, name: &str) -> Result<(), ClientError> {
        self.send("DELETE", "/workspace", &json!({ "workspaceName": name }))?;
        tracing::info!(instance = %self.name, workspace = name, "deleted workspace");
        Ok(())
    }

    fn list_repositories(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Repository>, ClientError> {
        self.get_json(&format!("/{workspace_id}/repositories"))
    }

    fn create_remote_repository(
        &self,
        workspace_id: &WorkspaceId,
        request: &CreateRemoteRepository,
    ) -> Result<(), ClientError> {
        self.send(
            "POST",
            &format!("/{workspace_id}/repositories/remote"),
            request,
        )?;
        tracing::info!(
            instance = %self.name,
            repository = %request.name,
            remote_url = %request.remote_repository_url,
            "created remote repository",
        );
        Ok(())
    }

    fn delete_repository(&self, repository_id: &RepositoryId) -> Result<(), ClientError> {
        let body = ManualTaskStart::delete_repository(repository_id.clone());
        self.send("POST", "/manualTask/start", &body)?;
        tracing::info!(instance = %self.name, repository_id = %repository_id, "started repository delete task");
        Ok(())
    }
}
