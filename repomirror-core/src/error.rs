//! Error types for repomirror-core.

use thiserror::Error;

/// Failures of a [`crate::RepoInstanceClient`] call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure, timeout or TLS error; no response was received.
    #[error("transport error talking to {instance}: {message}")]
    Transport { instance: String, message: String },

    /// The instance answered with a non-success status.
    #[error("{instance} responded with HTTP {status}: {body}")]
    Status {
        instance: String,
        status: u16,
        body: String,
    },

    /// HTTP 409, e.g. a workspace with that name already exists.
    #[error("conflict on {instance}: {body}")]
    Conflict { instance: String, body: String },

    /// The response body was not the JSON shape we expected.
    #[error("could not decode response from {instance}: {message}")]
    Decode { instance: String, message: String },
}

/// Errors raised while resolving configuration from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {key}")]
    Missing { key: String },

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}
