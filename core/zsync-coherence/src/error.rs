//! Error types for the coherency layer.

use thiserror::Error;
use zsync_store::StoreError;

/// Result type for coherency operations.
pub type CoherenceResult<T> = Result<T, CoherenceError>;

/// Errors that can occur in coherency operations.
#[derive(Debug, Error)]
pub enum CoherenceError {
    /// No store address can be derived for the entity.
    #[error("token resolution failed: {0}")]
    TokenResolution(String),

    /// A caller handed over something that is not a dump.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The shared store rejected or failed an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<zsync_types::Error> for CoherenceError {
    fn from(err: zsync_types::Error) -> Self {
        match err {
            zsync_types::Error::Serialization(e) => Self::Serialization(e),
            other => Self::InvalidArgument(other.to_string()),
        }
    }
}

/// Failure reported by a host entity's transport.
///
/// Transport failures never become [`CoherenceError`]s; they are carried in
/// sync reports and freshness results so the caller can decide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never reached the server.
    #[error("network error: {0}")]
    Network(String),

    /// The server has no such resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered with an error status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}
