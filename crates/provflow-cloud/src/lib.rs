//! provflow Cloud Reconciliation
//!
//! This crate provides the wait-loop shared by every provflow resource:
//! after a create/update/delete call against an eventually-consistent control
//! plane, poll the resource until it reaches a terminal state, under a
//! deadline, while staying cancellable.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │          provider framework (CRUD calls)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │ create / update / delete / read
//! ┌─────────────────▼───────────────────────────────┐
//! │                 provflow-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │     LifecycleDriver<K, A>  (per kind)     │   │
//! │  └───────────────────┬──────────────────────┘   │
//! │  ┌───────────────────▼──────────────────────┐   │
//! │  │   Poller  (interval, deadline, cancel)    │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │ trait ResourceApi<K>
//! ┌─────────────────▼───────────────────────────────┐
//! │        remote control-plane API client           │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use provflow_cloud::{LifecycleDriver, PollConfig, ResourceSpec, WaitPolicy};
//! use std::time::Duration;
//!
//! let driver: LifecycleDriver<Vpc, _> = LifecycleDriver::new(api);
//! let policy = WaitPolicy::Wait(
//!     PollConfig::new(Duration::from_secs(2)).with_deadline(Duration::from_secs(600)),
//! );
//! let vpc = driver
//!     .create(&ResourceSpec::new("main", serde_json::json!({ "cidr_block": "10.0.0.0/16" })), &policy)
//!     .await?;
//! ```

pub mod action;
pub mod driver;
pub mod error;
pub mod poller;
pub mod provider;
pub mod state;
pub mod status;

// Re-exports
pub use action::Operation;
pub use driver::{LifecycleDriver, Provisioned, WaitPolicy};
pub use error::{ApiError, ApiResult, PollError, ReconcileError, Result};
pub use poller::{DEFAULT_MAX_TRANSIENT_RETRIES, PollConfig, PollOutcome, Poller};
pub use provider::{ResourceApi, ResourceKind, ResourceSpec};
pub use state::{ResourceHandle, Snapshot};
pub use status::{
    Classification, Classify, GenericStatus, Phase, StatePredicates, StatusVocabulary,
};
pub use tokio_util::sync::CancellationToken;
