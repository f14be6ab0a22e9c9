//! Cluster read error types.

use kq_protocol::ResourceKind;
use thiserror::Error;

/// Errors returned by [`ClusterReader`](crate::ClusterReader) operations.
///
/// `NotFound` is the only variant the dispatcher reports as a missing
/// object; everything else is an upstream failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("API server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid cluster configuration: {0}")]
    Config(String),
}

impl ClusterError {
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        ClusterError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }

    /// Short, stable code safe to show outside the process.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ClusterError::NotFound { .. } => "not_found",
            ClusterError::Unauthorized(_) => "unauthorized",
            ClusterError::Forbidden(_) => "forbidden",
            ClusterError::Timeout { .. } => "timeout",
            ClusterError::Transport(_) => "unreachable",
            ClusterError::Api { .. } => "api_error",
            ClusterError::Decode(_) => "bad_response",
            ClusterError::Config(_) => "config",
        }
    }
}

/// Convenience alias for cluster read results.
pub type ClusterResult<T> = Result<T, ClusterError>;
