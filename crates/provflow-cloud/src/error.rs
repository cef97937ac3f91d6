//! Error types for the reconciliation engine

use crate::action::Operation;
use crate::state::ResourceHandle;
use std::time::Duration;
use thiserror::Error;

/// Classified failure of a call against the remote control plane.
///
/// Adapters implementing [`crate::ResourceApi`] must map their transport
/// errors into one of these; the poller and drivers branch on the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The remote object does not exist (never created or already deleted)
    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure, timeout, 5xx and the like
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The remote understood the request and refused it
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Whether a fetch failing this way may be retried in place
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Unauthorized(_))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Hard errors surfaced by the poller itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("fetch failed {attempts} times in a row: {source}")]
    TransientExhausted {
        attempts: u32,
        #[source]
        source: ApiError,
    },

    #[error("fetch rejected: {0}")]
    Rejected(#[source] ApiError),
}

/// Errors returned by lifecycle drivers to their callers
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("{kind} '{handle}' not found")]
    NotFound {
        kind: &'static str,
        handle: ResourceHandle,
    },

    #[error("{kind} '{handle}' failed during {operation}: {reason}")]
    TerminalFailure {
        kind: &'static str,
        handle: ResourceHandle,
        operation: Operation,
        reason: String,
    },

    #[error("{kind} '{handle}' disappeared immediately after {operation}")]
    Disappeared {
        kind: &'static str,
        handle: ResourceHandle,
        operation: Operation,
    },

    #[error("Timeout: {kind} '{handle}' did not finish {operation} within {waited:?}")]
    Timeout {
        kind: &'static str,
        handle: ResourceHandle,
        operation: Operation,
        waited: Duration,
    },

    #[error("Giving up on {kind} '{handle}' after {attempts} failed fetches: {source}")]
    Transport {
        kind: &'static str,
        handle: ResourceHandle,
        attempts: u32,
        #[source]
        source: ApiError,
    },

    #[error("{operation} of {kind} '{handle}' was cancelled")]
    Cancelled {
        kind: &'static str,
        handle: ResourceHandle,
        operation: Operation,
    },

    #[error("{operation} of {kind} failed: {source}")]
    Api {
        kind: &'static str,
        operation: Operation,
        #[source]
        source: ApiError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] provflow_config::ConfigError),
}

impl ReconcileError {
    /// The handle the error concerns, if the remote assigned one.
    ///
    /// After a `Timeout`, `Transport` or `Cancelled` error the remote
    /// operation may still complete, so callers should persist this handle.
    pub fn handle(&self) -> Option<&ResourceHandle> {
        match self {
            ReconcileError::NotFound { handle, .. }
            | ReconcileError::TerminalFailure { handle, .. }
            | ReconcileError::Disappeared { handle, .. }
            | ReconcileError::Timeout { handle, .. }
            | ReconcileError::Transport { handle, .. }
            | ReconcileError::Cancelled { handle, .. } => Some(handle),
            ReconcileError::Api { .. }
            | ReconcileError::InvalidConfig(_)
            | ReconcileError::Config(_) => None,
        }
    }

    /// Whether a later read or wait may still resolve the resource
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::Timeout { .. }
                | ReconcileError::Transport { .. }
                | ReconcileError::Cancelled { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_classification() {
        assert!(ApiError::NotFound("vpc-1".into()).is_not_found());
        assert!(!ApiError::NotFound("vpc-1".into()).is_transient());
        assert!(ApiError::Transport("connection reset".into()).is_transient());
        assert!(ApiError::Unauthorized("token expired".into()).is_transient());
        assert!(!ApiError::Rejected("quota exceeded".into()).is_transient());
    }

    #[test]
    fn test_timeout_keeps_handle() {
        let err = ReconcileError::Timeout {
            kind: "database_cluster",
            handle: ResourceHandle::new("db-42"),
            operation: Operation::Create,
            waited: Duration::from_secs(1800),
        };
        assert!(err.is_retryable());
        assert_eq!(err.handle().map(|h| h.as_str()), Some("db-42"));
        assert_eq!(
            err.to_string(),
            "Timeout: database_cluster 'db-42' did not finish create within 1800s"
        );
    }

    #[test]
    fn test_terminal_failure_is_not_retryable() {
        let err = ReconcileError::TerminalFailure {
            kind: "nat_gateway",
            handle: ResourceHandle::new("nat-7"),
            operation: Operation::Create,
            reason: "Subnet has no route to an internet gateway".into(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().ends_with("Subnet has no route to an internet gateway"));
    }
}
