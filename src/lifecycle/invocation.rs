//! One reconciliation invocation.
//!
//! # Steps
//! ```text
//! 1. Load prior active IPs and pending counters    (missing → empty)
//! 2. Discover addresses from DNS                   (empty → abort, no changes)
//! 3. Describe the target group                     (failure → empty)
//! 4. Decide: to_register, counters, to_deregister
//! 5. Register                                      (failure → logged)
//! 6. Deregister                                    (failure → logged)
//! 7. Persist the active snapshot if registration succeeded or was not needed
//! 8. Persist the counters, always
//! ```
//!
//! The active snapshot must never claim an address was registered when
//! the register call failed, otherwise the next invocation would stop
//! counting it as a deregistration candidate.

use chrono::{DateTime, Utc};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ConfigError, SyncConfig, ValidationError};
use crate::dns::ConvergentLookup;
use crate::error::{SyncError, SyncResult};
use crate::observability::metrics::{self, MetricsSink};
use crate::reconcile::{
    decode_active_state, decode_pending_counters, encode_active_state, reconcile,
    targets_from_addresses, AddressSet, PendingCounters, PendingDecision,
};
use crate::store::ObjectStore;
use crate::target_group::TargetGroupApi;

/// Result of a register or deregister step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Nothing to send.
    Skipped,
    Succeeded,
    Failed,
}

/// What an invocation observed and did.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub run_id: Uuid,
    pub dns: AddressSet,
    pub registered: AddressSet,
    pub decision: PendingDecision,
    pub registration: CallOutcome,
    pub deregistration: CallOutcome,
    /// Whether the active snapshot was written.
    pub active_committed: bool,
    /// Whether the pending counters were written.
    pub counters_committed: bool,
}

/// Drives invocations against the configured collaborators.
pub struct Reconciler {
    config: SyncConfig,
    lookup: ConvergentLookup,
    store: Arc<dyn ObjectStore>,
    target_group: Arc<dyn TargetGroupApi>,
    metrics: Arc<dyn MetricsSink>,
}

impl Reconciler {
    pub fn new(
        config: SyncConfig,
        lookup: ConvergentLookup,
        store: Arc<dyn ObjectStore>,
        target_group: Arc<dyn TargetGroupApi>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            lookup,
            store,
            target_group,
            metrics,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one invocation.
    ///
    /// Fails only on a configuration error or when DNS returns no
    /// addresses; in both cases neither the target group nor the stored
    /// state is touched.
    pub async fn run(&self) -> SyncResult<InvocationReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "invocation",
            %run_id,
            dns_name = %self.config.load_balancer.dns_name
        );
        self.run_at(run_id, Utc::now()).instrument(span).await
    }

    async fn run_at(&self, run_id: Uuid, started_at: DateTime<Utc>) -> SyncResult<InvocationReport> {
        let threshold = NonZeroU32::new(self.config.deregistration.threshold).ok_or_else(|| {
            SyncError::Configuration(ConfigError::Validation(vec![ValidationError {
                field: "deregistration.threshold",
                message: "is required to be a positive number".into(),
            }]))
        })?;
        let dns_name = self.config.load_balancer.dns_name.as_str();
        let target_group = self.config.target_group.id.as_str();

        tracing::info!("Step 1: get active and pending IPs from the previous invocation");
        let (prior_active, prior_counters) = self.load_prior_state().await;

        tracing::info!("Step 2: get IPs from DNS");
        let dns = self
            .lookup
            .get_elb_ip_from_dns(dns_name, self.config.load_balancer.record_type())
            .await;
        tracing::info!(ips = %dns, count = dns.len(), "ELB IPs from DNS lookup");
        if dns.is_empty() {
            let err = SyncError::FatalEmptyDns {
                dns_name: dns_name.to_string(),
                target_group: target_group.to_string(),
            };
            tracing::error!(error = %err, "Aborting invocation");
            return Err(err);
        }

        tracing::info!("Step 3: get IPs from target group");
        let registered = match self.target_group.describe_registered(target_group).await {
            Ok(registered) => registered,
            Err(e) => {
                tracing::error!(target_group = %target_group, error = %e, "Failed to get target list from target group");
                AddressSet::new()
            }
        };
        tracing::info!(ips = %registered, count = registered.len(), "ELB IPs registered with the target group");

        if self.config.observability.ip_count_metric {
            metrics::record_ip_count(self.metrics.as_ref(), dns_name, dns.len());
        } else {
            tracing::debug!("IP count metric disabled, skipping");
        }

        tracing::info!("Step 4: get IPs pending registration and deregistration");
        let decision = reconcile(&dns, &registered, &prior_active, &prior_counters, threshold);
        tracing::info!(
            to_register = %decision.to_register,
            to_deregister = %decision.to_deregister,
            pending = ?decision.updated_counters,
            "Reconciliation decision"
        );

        tracing::info!(same_vpc = self.config.target_group.same_vpc, "Step 5: update target group");
        let registration = self.register(&decision.to_register).await;
        let deregistration = self.deregister(&decision.to_deregister).await;

        tracing::info!("Step 6: persist active and pending IPs");
        let active_committed = if decision.to_register.is_empty() || registration == CallOutcome::Succeeded {
            let snapshot = encode_active_state(dns_name, started_at, &dns);
            match snapshot.to_json() {
                Ok(body) => self.put(&self.config.active_state_key(), &body).await,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode active IP state");
                    false
                }
            }
        } else {
            tracing::info!(ips = %dns, "Registration failed, skipping upload of active IPs");
            false
        };

        let counters_committed = match serde_json::to_vec(&decision.updated_counters) {
            Ok(body) => self.put(&self.config.pending_state_key(), &body).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode pending IP state");
                false
            }
        };

        Ok(InvocationReport {
            run_id,
            dns,
            registered,
            decision,
            registration,
            deregistration,
            active_committed,
            counters_committed,
        })
    }

    async fn load_prior_state(&self) -> (AddressSet, PendingCounters) {
        let active_raw = self.get(&self.config.active_state_key()).await;
        let pending_raw = self.get(&self.config.pending_state_key()).await;

        let prior_active = decode_active_state(active_raw.as_deref());
        let prior_counters = decode_pending_counters(pending_raw.as_deref());
        tracing::info!(
            active = %prior_active,
            pending = ?prior_counters,
            "State from previous invocation"
        );
        (prior_active, prior_counters)
    }

    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key).await {
            Ok(Some(body)) => Some(body),
            Ok(None) => {
                tracing::warn!(key = %key, "No state from a previous invocation (normal on the first run)");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read state from previous invocation");
                None
            }
        }
    }

    async fn put(&self, key: &str, body: &[u8]) -> bool {
        match self.store.put(key, body).await {
            Ok(()) => {
                tracing::info!(key = %key, "Uploaded state");
                true
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to upload state");
                false
            }
        }
    }

    async fn register(&self, addresses: &AddressSet) -> CallOutcome {
        if addresses.is_empty() {
            tracing::info!("No pending registration IP found, skipping target registration");
            return CallOutcome::Skipped;
        }

        let targets = self.targets(addresses);
        tracing::info!(targets = ?targets, "Registering targets");
        match self.target_group.register(&self.config.target_group.id, &targets).await {
            Ok(()) => CallOutcome::Succeeded,
            Err(e) => {
                tracing::error!(
                    target_group = %self.config.target_group.id,
                    error = %e,
                    "Failed to register targets"
                );
                CallOutcome::Failed
            }
        }
    }

    async fn deregister(&self, addresses: &AddressSet) -> CallOutcome {
        if addresses.is_empty() {
            tracing::info!("No pending deregistration IP found, skipping target deregistration");
            return CallOutcome::Skipped;
        }

        let targets = self.targets(addresses);
        tracing::info!(targets = ?targets, "Deregistering targets");
        match self.target_group.deregister(&self.config.target_group.id, &targets).await {
            Ok(()) => CallOutcome::Succeeded,
            Err(e) => {
                tracing::error!(
                    target_group = %self.config.target_group.id,
                    error = %e,
                    "Failed to deregister targets"
                );
                CallOutcome::Failed
            }
        }
    }

    fn targets(&self, addresses: &AddressSet) -> Vec<crate::reconcile::Target> {
        targets_from_addresses(
            addresses,
            self.config.load_balancer.listener_port,
            self.config.target_group.same_vpc,
        )
    }
}
