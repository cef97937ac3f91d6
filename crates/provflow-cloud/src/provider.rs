//! Remote resource API abstraction

use crate::error::ApiResult;
use crate::state::{ResourceHandle, Snapshot};
use crate::status::StatusVocabulary;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A kind of remote resource (VPC, subnet, database cluster, ...).
///
/// Implemented by zero-sized marker types; the kind fixes the status
/// vocabulary the drivers classify against.
pub trait ResourceKind: Send + Sync + 'static {
    /// Kind name used in logs, errors and configuration (e.g. "nat_gateway")
    const NAME: &'static str;

    /// Built-in create deadline, used when configuration sets none
    const CREATE_TIMEOUT: Option<Duration> = None;

    /// Built-in update deadline, used when configuration sets none
    const UPDATE_TIMEOUT: Option<Duration> = None;

    /// Built-in delete deadline; `None` polls until cancelled
    const DELETE_TIMEOUT: Option<Duration> = None;

    type Status: StatusVocabulary;
}

/// Remote control-plane operations for one resource kind.
///
/// Mutating calls return as soon as the remote accepts them; provisioning
/// continues asynchronously and is observed through [`ResourceApi::get`].
/// Implementations must report a missing object as [`crate::ApiError::NotFound`]
/// and network/auth problems as `Transport`/`Unauthorized`, never the other
/// way round.
#[async_trait]
pub trait ResourceApi<K: ResourceKind>: Send + Sync {
    /// Issue the create call and return the identity the remote assigned
    async fn create(&self, spec: &ResourceSpec) -> ApiResult<ResourceHandle>;

    /// Fetch the current state of one object
    async fn get(&self, handle: &ResourceHandle) -> ApiResult<Snapshot<K::Status>>;

    /// Issue an update call with the changed fields
    async fn update(&self, handle: &ResourceHandle, changes: &serde_json::Value) -> ApiResult<()>;

    /// Issue the delete call
    async fn delete(&self, handle: &ResourceHandle) -> ApiResult<()>;
}

/// Desired configuration for a resource to create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource name
    pub name: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
