//! Simulated control plane for provflow
//!
//! An in-memory [`ResourceApi`](provflow_cloud::ResourceApi) for any resource
//! kind. Objects walk through scripted statuses one fetch at a time, and
//! transport errors, auth failures, hung fetches and create rejections can be
//! injected. Used by the test suites and by `provflow simulate`.
//!
//! # Example
//!
//! ```ignore
//! use provflow_sim::SimulatedCloud;
//! use provflow_resources::network::{Vpc, VpcStatus};
//!
//! let sim = SimulatedCloud::<Vpc>::new([VpcStatus::Pending, VpcStatus::Available])?
//!     .with_delete_statuses([VpcStatus::Deleting]);
//! let driver = LifecycleDriver::new(Arc::new(sim));
//! ```

pub mod cloud;
pub mod error;
pub mod script;

pub use cloud::{Call, Fault, SimulatedCloud};
pub use error::{Result, SimError};
pub use script::parse_script;
