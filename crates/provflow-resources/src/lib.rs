//! Resource kinds for provflow
//!
//! Each module declares the status vocabularies of a family of remote
//! resources and the [`ResourceKind`](provflow_cloud::ResourceKind) markers
//! that bind a vocabulary to a kind name and its default deadlines.
//!
//! # Example
//!
//! ```ignore
//! use provflow_cloud::LifecycleDriver;
//! use provflow_resources::network::Vpc;
//!
//! let driver: LifecycleDriver<Vpc, _> = LifecycleDriver::new(api);
//! ```

pub mod compute;
pub mod database;
pub mod network;
pub mod registry;
pub mod storage;

pub use registry::{KINDS, KindInfo, KindVisitor, StatusRow, find_kind, visit_kind};
