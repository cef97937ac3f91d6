//! Block volumes and snapshots

use provflow_cloud::{ResourceKind, status_vocabulary};
use std::time::Duration;

const TEN_MINUTES: Option<Duration> = Some(Duration::from_secs(10 * 60));

status_vocabulary! {
    /// Lifecycle states of a block volume
    pub enum VolumeStatus {
        Creating = "creating" => InProgress,
        Available = "available" => Ready,
        /// Attached to an instance; as usable as `available`
        InUse = "in_use" => Ready,
        Attaching = "attaching" => InProgress,
        Detaching = "detaching" => InProgress,
        /// Creation failed; a delete still cleans the volume up
        Error = "error" => Failed / InProgress,
        ErrorDeleting = "error_deleting" => Failed,
        Deleting = "deleting" => InProgress,
        Deleted = "deleted" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Block storage volume
#[derive(Debug, Clone, Copy)]
pub struct Volume;

impl ResourceKind for Volume {
    const NAME: &'static str = "volume";
    const CREATE_TIMEOUT: Option<Duration> = TEN_MINUTES;
    const UPDATE_TIMEOUT: Option<Duration> = TEN_MINUTES;

    type Status = VolumeStatus;
}

status_vocabulary! {
    /// Lifecycle states of a volume snapshot
    pub enum SnapshotStatus {
        Pending = "pending" => InProgress,
        Completed = "completed" => Ready,
        Error = "error" => Failed,
        Deleting = "deleting" => InProgress,
        Deleted = "deleted" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Point-in-time copy of a volume
#[derive(Debug, Clone, Copy)]
pub struct VolumeSnapshot;

impl ResourceKind for VolumeSnapshot {
    const NAME: &'static str = "snapshot";
    const CREATE_TIMEOUT: Option<Duration> = TEN_MINUTES;
    const UPDATE_TIMEOUT: Option<Duration> = TEN_MINUTES;

    type Status = SnapshotStatus;
}
