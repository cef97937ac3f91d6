//! Simulator error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("'{status}' is not a {kind} status (expected one of: {expected})")]
    UnknownStatus {
        kind: &'static str,
        status: String,
        expected: String,
    },

    #[error("create script for {0} must have at least one status")]
    EmptyScript(&'static str),
}

pub type Result<T> = std::result::Result<T, SimError>;
