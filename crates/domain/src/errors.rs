//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for bcsync
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncError {
    /// Missing or invalid configuration (env vars, config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token acquisition failed; fatal for the run
    #[error("Authentication error: {0}")]
    Auth(String),

    /// One of the external APIs rejected a call with a non-2xx status.
    /// Fatal when raised by the delta fetch, isolated when raised by a
    /// per-record upsert.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Record failed upsert preconditions (e.g. missing email)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// True when the error indicates rejected credentials or insufficient
    /// permissions on the remote API.
    pub fn is_auth_related(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Api { status: 401 | 403, .. })
    }
}

/// Result type alias for bcsync operations
pub type Result<T> = std::result::Result<T, SyncError>;
