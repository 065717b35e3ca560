//! Target group targets.

use serde::{Deserialize, Serialize};

use crate::reconcile::address_set::AddressSet;

/// Availability zone used for targets outside the target group's VPC.
pub const ALL_AVAILABILITY_ZONES: &str = "all";

/// A single target as consumed by the target group API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "Port")]
    pub port: u16,

    #[serde(rename = "AvailabilityZone", default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

impl Target {
    /// Whether `other` names the same (address, port) pair.
    pub fn same_endpoint(&self, other: &Target) -> bool {
        self.id == other.id && self.port == other.port
    }
}

/// Build targets for `addresses`, sorted by address.
pub fn targets_from_addresses(addresses: &AddressSet, listener_port: u16, same_vpc: bool) -> Vec<Target> {
    addresses
        .iter()
        .map(|address| Target {
            id: address.to_string(),
            port: listener_port,
            availability_zone: (!same_vpc).then(|| ALL_AVAILABILITY_ZONES.to_string()),
        })
        .collect()
}
