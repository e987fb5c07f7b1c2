//! Error types shared by the allow-list client, the service tag provider
//! and the reconciliation run.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Result alias using [`SyncError`].
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while reconciling the allow-list.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required setting is missing or invalid. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-success status or connection failure on a remote call.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote answered with a body of an unexpected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The target account is unknown or not accessible with the credential.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A single create/delete mutation was rejected by the remote.
    #[error("Operation rejected: {0}")]
    Operation(OperationError),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Error payload reported by the remote for a rejected mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub errors: Vec<RemoteError>,
}

impl OperationError {
    pub fn new(errors: Vec<RemoteError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("no error details reported");
        }
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for OperationError {}

impl From<OperationError> for SyncError {
    fn from(err: OperationError) -> Self {
        SyncError::Operation(err)
    }
}
