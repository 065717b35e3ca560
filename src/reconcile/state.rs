//! Persisted state shapes.
//!
//! Two JSON objects are stored per load balancer:
//!
//! ```text
//! <dns name>/active_ip.json   {"LoadBalancerName", "TimeStamp", "IPList", "IPCount"}
//! <dns name>/pending_ip.json  {"<address>": <invocation count>, ...}
//! ```
//!
//! Decoding never fails: a missing or unreadable object is an empty state,
//! which is what the very first invocation sees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reconcile::address_set::AddressSet;
use crate::reconcile::engine::PendingCounters;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Addresses observed in DNS by one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSnapshot {
    #[serde(rename = "LoadBalancerName")]
    pub load_balancer_name: String,

    #[serde(rename = "TimeStamp")]
    pub timestamp: String,

    #[serde(rename = "IPList")]
    pub ip_list: AddressSet,

    #[serde(rename = "IPCount")]
    pub ip_count: usize,
}

impl ActiveSnapshot {
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Build the snapshot persisted after a successful invocation.
pub fn encode_active_state(name: &str, timestamp: DateTime<Utc>, dns: &AddressSet) -> ActiveSnapshot {
    ActiveSnapshot {
        load_balancer_name: name.to_string(),
        timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ip_list: dns.clone(),
        ip_count: dns.len(),
    }
}

/// Extract `IPList` from a stored snapshot.
pub fn decode_active_state(raw: Option<&[u8]>) -> AddressSet {
    let Some(bytes) = raw else {
        return AddressSet::new();
    };

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => match map.get("IPList") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => AddressSet::new(),
        },
        Ok(_) => {
            tracing::warn!("Active IP state is not a JSON object, treating as empty");
            AddressSet::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse active IP state, treating as empty");
            AddressSet::new()
        }
    }
}

/// Read the stored pending-deregistration counters.
///
/// Entries whose count is not a positive integer are skipped.
pub fn decode_pending_counters(raw: Option<&[u8]>) -> PendingCounters {
    let Some(bytes) = raw else {
        return PendingCounters::new();
    };

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(address, count)| {
                let count = count.as_u64().and_then(|c| u32::try_from(c).ok());
                match count {
                    Some(c) if c > 0 => Some((address, c)),
                    _ => {
                        tracing::warn!(address = %address, "Skipping invalid pending counter");
                        None
                    }
                }
            })
            .collect(),
        Ok(_) => {
            tracing::warn!("Pending IP state is not a JSON object, treating as empty");
            PendingCounters::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse pending IP state, treating as empty");
            PendingCounters::new()
        }
    }
}
