//! Compute instances

use provflow_cloud::{ResourceKind, status_vocabulary};
use std::time::Duration;

status_vocabulary! {
    /// Lifecycle states of a virtual machine instance
    pub enum InstanceStatus {
        Pending = "pending" => InProgress,
        Starting = "starting" => InProgress,
        Running = "running" => Ready,
        Stopping = "stopping" => InProgress,
        Rebooting = "rebooting" => InProgress,
        ShuttingDown = "shutting_down" => InProgress,
        Failed = "failed" => Failed,
        /// Terminated by the platform before it ever ran
        TerminatedWithError = "terminated_with_error" => Failed,
        Terminated = "terminated" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Virtual machine instance
#[derive(Debug, Clone, Copy)]
pub struct Instance;

impl ResourceKind for Instance {
    const NAME: &'static str = "instance";
    const CREATE_TIMEOUT: Option<Duration> = Some(Duration::from_secs(15 * 60));
    const UPDATE_TIMEOUT: Option<Duration> = Some(Duration::from_secs(15 * 60));

    type Status = InstanceStatus;
}
