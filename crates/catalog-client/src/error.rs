//! Error types for the catalog client

use std::time::Duration;
use thiserror::Error;

/// Catalog client error type
#[derive(Error, Debug)]
pub enum Error {
    /// Connection, DNS or I/O failure before a response arrived
    #[error("Transport error: {0}")]
    Transport(String),

    /// No response arrived within the client-side timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// A read returned a non-2xx status
    #[error("Registry returned {status}: {body}")]
    Registry {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A register/deregister call did not return 200
    #[error("Registration failed with status {status}: {body}")]
    Registration {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A first-entry lookup found no instances
    #[error("No instances registered for service: {0}")]
    NotFound(String),

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Request body could not be serialized
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Caller supplied an argument the registry cannot address
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether the failure happened below the HTTP layer.
    ///
    /// Only these are worth retrying from the caller's side; the client
    /// itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Registry { status, .. } | Error::Registration { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
