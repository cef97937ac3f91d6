//! Managed database clusters

use provflow_cloud::{ResourceKind, status_vocabulary};
use std::time::Duration;

status_vocabulary! {
    /// Lifecycle states of a managed database cluster
    pub enum DatabaseClusterStatus {
        Creating = "creating" => InProgress,
        Available = "available" => Ready,
        Modifying = "modifying" => InProgress,
        BackingUp = "backing_up" => InProgress,
        Upgrading = "upgrading" => InProgress,
        Rebooting = "rebooting" => InProgress,
        Failed = "failed" => Failed,
        /// The cluster's encryption key is no longer usable
        InaccessibleEncryption = "inaccessible_encryption" => Failed,
        Deleting = "deleting" => InProgress,
        Deleted = "deleted" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Managed database cluster
#[derive(Debug, Clone, Copy)]
pub struct DatabaseCluster;

impl ResourceKind for DatabaseCluster {
    const NAME: &'static str = "database_cluster";
    const CREATE_TIMEOUT: Option<Duration> = Some(Duration::from_secs(30 * 60));
    const UPDATE_TIMEOUT: Option<Duration> = Some(Duration::from_secs(30 * 60));

    type Status = DatabaseClusterStatus;
}
