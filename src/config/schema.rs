//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for one
//! reconciliation invocation. All types derive Serde traits for
//! deserialization from config files.

use hickory_resolver::proto::rr::RecordType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// File name of the active-IP snapshot under the load balancer prefix.
pub const ACTIVE_FILENAME: &str = "active_ip.json";

/// File name of the pending-deregistration counters under the load balancer prefix.
pub const PENDING_DEREGISTRATION_FILENAME: &str = "pending_ip.json";

/// Root configuration for the target synchronizer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// The load balancer whose DNS name is tracked.
    pub load_balancer: LoadBalancerConfig,

    /// DNS lookup behavior.
    pub lookup: LookupConfig,

    /// Deregistration hysteresis.
    pub deregistration: DeregistrationConfig,

    /// Persisted state location.
    pub state: StateConfig,

    /// Target group being populated.
    pub target_group: TargetGroupConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl SyncConfig {
    /// Object key of the active-IP snapshot.
    pub fn active_state_key(&self) -> String {
        format!("{}/{}", self.load_balancer.dns_name, ACTIVE_FILENAME)
    }

    /// Object key of the pending-deregistration counters.
    pub fn pending_state_key(&self) -> String {
        format!("{}/{}", self.load_balancer.dns_name, PENDING_DEREGISTRATION_FILENAME)
    }
}

/// Tracked load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadBalancerConfig {
    /// Full DNS name of the load balancer
    /// (e.g., "internal-alb-123.us-east-1.elb.amazonaws.com").
    pub dns_name: String,

    /// Traffic listener port registered for every target.
    pub listener_port: u16,

    /// Record type to look up ("A" or "AAAA").
    pub record_type: String,
}

impl LoadBalancerConfig {
    /// Parsed record type. Anything other than "AAAA" means A.
    pub fn record_type(&self) -> RecordType {
        if self.record_type.eq_ignore_ascii_case("AAAA") {
            RecordType::AAAA
        } else {
            RecordType::A
        }
    }
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            dns_name: String::new(),
            listener_port: 80,
            record_type: "A".to_string(),
        }
    }
}

/// DNS lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Maximum DNS lookups per invocation.
    pub max_attempts: u32,

    /// Answers with fewer records than this end the lookup early.
    pub full_answer_size: usize,

    /// Timeout for a single nameserver in milliseconds.
    pub per_server_timeout_ms: u64,

    /// Timeout across all nameservers of one resolve call in milliseconds.
    pub overall_timeout_ms: u64,
}

impl LookupConfig {
    pub fn per_server_timeout(&self) -> Duration {
        Duration::from_millis(self.per_server_timeout_ms)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            full_answer_size: crate::dns::FULL_ANSWER_SIZE,
            per_server_timeout_ms: 1_000,
            overall_timeout_ms: 10_000,
        }
    }
}

/// Deregistration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeregistrationConfig {
    /// Number of consecutive invocations an address must be missing from
    /// DNS before it is deregistered.
    pub threshold: u32,
}

impl Default for DeregistrationConfig {
    fn default() -> Self {
        Self { threshold: 3 }
    }
}

/// Persisted state configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StateConfig {
    /// Bucket holding the state objects (root directory for the file store).
    pub bucket: String,
}

/// Target group configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetGroupConfig {
    /// Target group identifier (ARN).
    pub id: String,

    /// Whether the load balancer lives in the same VPC as the target group.
    /// Targets outside it are registered with availability zone "all".
    pub same_vpc: bool,

    /// Directory of the file-backed target group registry.
    pub registry_dir: String,
}

impl Default for TargetGroupConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            same_vpc: true,
            registry_dir: "target-groups".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Publish the `LoadBalancerIPCount` metric.
    pub ip_count_metric: bool,

    /// Prometheus push gateway URL the metrics are pushed to after the run.
    pub push_gateway: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ip_count_metric: false,
            push_gateway: None,
        }
    }
}
