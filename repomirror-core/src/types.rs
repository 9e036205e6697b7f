//! Domain types for workspaces, repositories and the request bodies the
//! mirror sends to an instance.
//!
//! Field names follow the instance's JSON surface (camelCase); Rust-side
//! names stay snake_case.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Instance-local workspace identifier, assigned by the owning instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub String);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for WorkspaceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkspaceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Instance-local repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(pub String);

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepositoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepositoryId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Package type
// ---------------------------------------------------------------------------

/// Package format of a repository, kept exactly as the instance reports it.
///
/// The text is echoed into remote-proxy URLs and create requests, so an
/// instance that says `GENERIC` gets `GENERIC` back. Only Docker and
/// Universal change the URL shape; they are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageType(String);

impl PackageType {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_docker(&self) -> bool {
        self.0.eq_ignore_ascii_case("docker")
    }

    pub fn is_universal(&self) -> bool {
        self.0.eq_ignore_ascii_case("universal")
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageType {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PackageType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// A named top-level grouping of repositories on one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
}

impl Workspace {
    pub fn new(id: impl Into<WorkspaceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Repository summary as returned by `GET /{workspaceId}/repositories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: RepositoryId,
    pub name: String,
    pub package_type: PackageType,
    #[serde(default)]
    pub repository_type: String,
    #[serde(default)]
    pub status: String,
    pub workspace_id: WorkspaceId,
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Basic-auth credentials for one instance.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both halves present. Incomplete credentials are never forwarded.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /{workspaceId}/repositories/remote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRemoteRepository {
    pub name: String,
    pub package_type: PackageType,
    pub remote_repository_url: String,
    pub is_remote_cache_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_repository_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_repository_password: Option<String>,
}

impl CreateRemoteRepository {
    /// Remote cache is always enabled; upstream credentials are attached only
    /// when complete.
    pub fn new(
        name: impl Into<String>,
        package_type: PackageType,
        remote_url: impl Into<String>,
        upstream: &Credentials,
    ) -> Self {
        let (username, password) = if upstream.is_complete() {
            (
                Some(upstream.username.clone()),
                Some(upstream.password.clone()),
            )
        } else {
            (None, None)
        };
        Self {
            name: name.into(),
            package_type,
            remote_repository_url: remote_url.into(),
            is_remote_cache_enabled: true,
            remote_repository_username: username,
            remote_repository_password: password,
        }
    }
}

/// Body of `POST /manualTask/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualTaskStart {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub additional_data: ManualTaskData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualTaskData {
    pub repository_id: RepositoryId,
}

impl ManualTaskStart {
    pub fn delete_repository(repository_id: RepositoryId) -> Self {
        Self {
            kind: "deleteRepository",
            additional_data: ManualTaskData { repository_id },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn newtype_display() {
        assert_eq!(WorkspaceId::from("ws-1").to_string(), "ws-1");
        assert_eq!(RepositoryId::from("r-9").to_string(), "r-9");
    }

    #[test]
    fn package_type_shape_checks_ignore_case() {
        assert!(PackageType::from("DOCKER").is_docker());
        assert!(PackageType::from("docker").is_docker());
        assert!(PackageType::from("Universal").is_universal());
        assert!(!PackageType::from("GENERIC").is_docker());
        assert_eq!(PackageType::from("GENERIC").to_string(), "GENERIC");
    }

    #[test]
    fn repository_deserializes_from_camel_case() {
        let repo: Repository = serde_json::from_value(json!({
            "id": "r1",
            "name": "pkg1",
            "packageType": "npm",
            "repositoryType": "local",
            "status": "ready",
            "workspaceId": "w1"
        }))
        .expect("deserialize");
        assert_eq!(repo.package_type, PackageType::from("npm"));
        assert_eq!(repo.workspace_id, WorkspaceId::from("w1"));
    }

    #[test]
    fn remote_repository_omits_incomplete_credentials() {
        let body = CreateRemoteRepository::new(
            "remote-pkg1",
            PackageType::from("GENERIC"),
            "https://src/GENERIC/A/pkg1",
            &Credentials::new("admin", ""),
        );
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            value,
            json!({
                "name": "remote-pkg1",
                "packageType": "GENERIC",
                "remoteRepositoryUrl": "https://src/GENERIC/A/pkg1",
                "isRemoteCacheEnabled": true
            })
        );
    }

    #[test]
    fn remote_repository_forwards_complete_credentials() {
        let body = CreateRemoteRepository::new(
            "remote-pkg1",
            PackageType::from("DOCKER"),
            "https://src/A/pkg1",
            &Credentials::new("admin", "s3cret"),
        );
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["remoteRepositoryUsername"], json!("admin"));
        assert_eq!(value["remoteRepositoryPassword"], json!("s3cret"));
    }

    #[test]
    fn manual_task_body_shape() {
        let body = ManualTaskStart::delete_repository(RepositoryId::from("r1"));
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            json!({"type": "deleteRepository", "additionalData": {"repositoryId": "r1"}})
        );
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
