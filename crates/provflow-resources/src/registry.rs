//! Registry of every resource kind provflow manages
//!
//! Generic code is written against `K: ResourceKind`; the registry is how a
//! kind chosen at runtime (a CLI argument, a configuration key) reaches it.

use crate::compute::Instance;
use crate::database::DatabaseCluster;
use crate::network::{
    ElasticIp, LoadBalancer, NatGateway, RouteTable, SecurityGroup, Subnet, Vpc, VpcPeering,
};
use crate::storage::{Volume, VolumeSnapshot};
use provflow_cloud::status::normalize_status;
use provflow_cloud::{Phase, ResourceKind, StatusVocabulary};
use serde::Serialize;
use std::time::Duration;

/// One status value and how it classifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub status: &'static str,
    pub phase: Phase,
    pub delete_phase: Phase,
}

/// Static description of one resource kind
#[derive(Debug, Clone, Copy)]
pub struct KindInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub create_timeout: Option<Duration>,
    pub update_timeout: Option<Duration>,
    pub delete_timeout: Option<Duration>,
    statuses: fn() -> Vec<StatusRow>,
}

impl KindInfo {
    pub const fn of<K: ResourceKind>(description: &'static str) -> Self {
        Self {
            name: K::NAME,
            description,
            create_timeout: K::CREATE_TIMEOUT,
            update_timeout: K::UPDATE_TIMEOUT,
            delete_timeout: K::DELETE_TIMEOUT,
            statuses: status_table::<K>,
        }
    }

    /// Classification table, in vocabulary declaration order
    pub fn statuses(&self) -> Vec<StatusRow> {
        (self.statuses)()
    }

    /// Status names that classify as `phase` outside of deletion
    pub fn statuses_in(&self, phase: Phase) -> Vec<&'static str> {
        self.statuses()
            .into_iter()
            .filter(|row| row.phase == phase)
            .map(|row| row.status)
            .collect()
    }
}

fn status_table<K: ResourceKind>() -> Vec<StatusRow> {
    <K::Status as StatusVocabulary>::ALL
        .iter()
        .map(|status| StatusRow {
            status: status.as_str(),
            phase: status.phase(),
            delete_phase: status.delete_phase(),
        })
        .collect()
}

/// Generic code to run against a kind picked by name
pub trait KindVisitor {
    type Output;

    fn visit<K: ResourceKind>(self) -> Self::Output;
}

macro_rules! kinds {
    ($($kind:ty => $description:literal),+ $(,)?) => {
        /// Every kind, in display order
        pub static KINDS: &[KindInfo] = &[$(KindInfo::of::<$kind>($description)),+];

        /// Run `visitor` against the kind called `name`.
        ///
        /// Returns `None` when no kind has that name.
        pub fn visit_kind<V: KindVisitor>(name: &str, visitor: V) -> Option<V::Output> {
            let name = normalize_status(name);
            $(
                if name == <$kind as ResourceKind>::NAME {
                    return Some(visitor.visit::<$kind>());
                }
            )+
            None
        }
    };
}

kinds! {
    DatabaseCluster => "Managed database cluster",
    Vpc => "Virtual private cloud",
    Subnet => "Subnet inside a VPC",
    NatGateway => "Managed NAT gateway",
    RouteTable => "Route table attached to a VPC",
    SecurityGroup => "Security group",
    VpcPeering => "Peering connection between two VPCs",
    LoadBalancer => "Load balancer",
    ElasticIp => "Static public address",
    Instance => "Virtual machine instance",
    Volume => "Block storage volume",
    VolumeSnapshot => "Point-in-time copy of a volume",
}

/// Look up a kind by name (`nat-gateway` and `NAT_GATEWAY` both work)
pub fn find_kind(name: &str) -> Option<&'static KindInfo> {
    let name = normalize_status(name);
    KINDS.iter().find(|info| info.name == name)
}
