//! Networking resources
//!
//! VPCs and their satellites (subnets, route tables, NAT gateways, peering
//! connections), plus security groups, load balancers and elastic IPs.

use provflow_cloud::{ResourceKind, status_vocabulary};
use std::time::Duration;

const TEN_MINUTES: Option<Duration> = Some(Duration::from_secs(10 * 60));

/// Declare a network kind with the plain `pending / available / failed /
/// deleting / deleted` lifecycle and the default ten minute deadlines.
macro_rules! pending_available_kind {
    ($(#[$meta:meta])* $kind:ident, $status:ident, $name:literal) => {
        status_vocabulary! {
            #[doc = concat!("Lifecycle states of a `", $name, "`")]
            pub enum $status {
                Pending = "pending" => InProgress,
                Available = "available" => Ready,
                Failed = "failed" => Failed,
                Deleting = "deleting" => InProgress,
                Deleted = "deleted" => Absent,
                Unknown = "unknown" => InProgress,
            }
            unknown = Unknown;
        }

        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $kind;

        impl ResourceKind for $kind {
            const NAME: &'static str = $name;
            const CREATE_TIMEOUT: Option<Duration> = TEN_MINUTES;
            const UPDATE_TIMEOUT: Option<Duration> = TEN_MINUTES;

            type Status = $status;
        }
    };
}

pending_available_kind!(
    /// Virtual private cloud
    Vpc,
    VpcStatus,
    "vpc"
);

pending_available_kind!(
    /// Subnet inside a VPC
    Subnet,
    SubnetStatus,
    "subnet"
);

pending_available_kind!(
    /// Managed NAT gateway
    NatGateway,
    NatGatewayStatus,
    "nat_gateway"
);

status_vocabulary! {
    /// Lifecycle states of a route table
    pub enum RouteTableStatus {
        Pending = "pending" => InProgress,
        Active = "active" => Ready,
        Failed = "failed" => Failed,
        Deleting = "deleting" => InProgress,
        Deleted = "deleted" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Route table attached to a VPC
#[derive(Debug, Clone, Copy)]
pub struct RouteTable;

impl ResourceKind for RouteTable {
    const NAME: &'static str = "route_table";
    const CREATE_TIMEOUT: Option<Duration> = TEN_MINUTES;
    const UPDATE_TIMEOUT: Option<Duration> = TEN_MINUTES;

    type Status = RouteTableStatus;
}

status_vocabulary! {
    /// Lifecycle states of a security group
    pub enum SecurityGroupStatus {
        Creating = "creating" => InProgress,
        Active = "active" => Ready,
        Updating = "updating" => InProgress,
        Failed = "failed" => Failed,
        Deleting = "deleting" => InProgress,
        Deleted = "deleted" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Security group (stateful firewall rule set)
#[derive(Debug, Clone, Copy)]
pub struct SecurityGroup;

impl ResourceKind for SecurityGroup {
    const NAME: &'static str = "security_group";
    const CREATE_TIMEOUT: Option<Duration> = TEN_MINUTES;
    const UPDATE_TIMEOUT: Option<Duration> = TEN_MINUTES;

    type Status = SecurityGroupStatus;
}

status_vocabulary! {
    /// Lifecycle states of a VPC peering connection.
    ///
    /// A request the peer rejected or let expire fails creation, but deleting
    /// it is still expected to reach `deleted`.
    pub enum VpcPeeringStatus {
        InitiatingRequest = "initiating_request" => InProgress,
        PendingAcceptance = "pending_acceptance" => InProgress,
        Provisioning = "provisioning" => InProgress,
        Active = "active" => Ready,
        Failed = "failed" => Failed,
        Rejected = "rejected" => Failed / InProgress,
        Expired = "expired" => Failed / InProgress,
        Deleting = "deleting" => InProgress,
        Deleted = "deleted" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Peering connection between two VPCs
#[derive(Debug, Clone, Copy)]
pub struct VpcPeering;

impl ResourceKind for VpcPeering {
    const NAME: &'static str = "vpc_peering";
    const CREATE_TIMEOUT: Option<Duration> = TEN_MINUTES;
    const UPDATE_TIMEOUT: Option<Duration> = TEN_MINUTES;

    type Status = VpcPeeringStatus;
}

status_vocabulary! {
    /// Lifecycle states of a load balancer
    pub enum LoadBalancerStatus {
        Provisioning = "provisioning" => InProgress,
        Active = "active" => Ready,
        Updating = "updating" => InProgress,
        Failed = "failed" => Failed,
        Deleting = "deleting" => InProgress,
        Deleted = "deleted" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Layer 4/7 load balancer
#[derive(Debug, Clone, Copy)]
pub struct LoadBalancer;

impl ResourceKind for LoadBalancer {
    const NAME: &'static str = "load_balancer";
    const CREATE_TIMEOUT: Option<Duration> = Some(Duration::from_secs(15 * 60));
    const UPDATE_TIMEOUT: Option<Duration> = Some(Duration::from_secs(15 * 60));

    type Status = LoadBalancerStatus;
}

status_vocabulary! {
    /// Lifecycle states of an elastic IP
    pub enum ElasticIpStatus {
        Allocating = "allocating" => InProgress,
        Allocated = "allocated" => Ready,
        Associated = "associated" => Ready,
        Failed = "failed" => Failed,
        Releasing = "releasing" => InProgress,
        Released = "released" => Absent,
        Unknown = "unknown" => InProgress,
    }
    unknown = Unknown;
}

/// Static public address
#[derive(Debug, Clone, Copy)]
pub struct ElasticIp;

impl ResourceKind for ElasticIp {
    const NAME: &'static str = "elastic_ip";
    const CREATE_TIMEOUT: Option<Duration> = TEN_MINUTES;
    const UPDATE_TIMEOUT: Option<Duration> = TEN_MINUTES;

    type Status = ElasticIpStatus;
}
