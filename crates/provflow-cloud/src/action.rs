//! Lifecycle operations a driver performs

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provider::ResourceKind;

/// Operation being performed on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create a new resource and wait for it to become ready
    Create,
    /// Modify an existing resource and wait for it to settle
    Update,
    /// Delete a resource and wait for it to disappear
    Delete,
    /// Single fetch, no waiting
    Read,
    /// Resume waiting on a resource whose earlier operation did not finish
    Await,
}

impl Operation {
    /// Built-in deadline for this operation on kind `K`, if the kind declares one
    pub fn default_timeout<K: ResourceKind>(self) -> Option<Duration> {
        match self {
            Operation::Create | Operation::Await => K::CREATE_TIMEOUT,
            Operation::Update => K::UPDATE_TIMEOUT,
            Operation::Delete => K::DELETE_TIMEOUT,
            Operation::Read => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Read => write!(f, "read"),
            Operation::Await => write!(f, "wait"),
        }
    }
}
