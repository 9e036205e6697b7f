//! repomirror core library — domain types, the instance client seam,
//! errors and environment configuration.
//!
//! - [`types`] — workspaces, repositories, request bodies
//! - [`client`] — [`RepoInstanceClient`]
//! - [`error`] — [`ClientError`], [`ConfigError`]
//! - [`config`] — [`AppConfig`] and its parts

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::RepoInstanceClient;
pub use config::{AppConfig, InstanceConfig, LogSettings, SyncSettings};
pub use error::{ClientError, ConfigError};
pub use types::{
    CreateRemoteRepository, Credentials, ManualTaskStart, PackageType, Repository, RepositoryId,
    Workspace, WorkspaceId,
};
