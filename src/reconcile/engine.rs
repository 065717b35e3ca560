//! Registration and deregistration decisions.
//!
//! # Hysteresis
//! ```text
//! address in DNS, not registered        → register now
//! address missing from DNS, but active
//!   last run or still registered        → counter += 1 (starts at 1)
//! counter >= threshold                  → deregister
//! address no longer a candidate         → counter dropped (restarts at 1)
//! ```
//!
//! Registration is aggressive, deregistration waits for `threshold`
//! consecutive invocations so a single short DNS answer cannot drop live
//! backends.
//!
//! Every function here is pure: same inputs, same outputs, no I/O.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;

use crate::reconcile::address_set::AddressSet;

/// Invocation count per address pending deregistration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingCounters(BTreeMap<String, u32>);

impl PendingCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<u32> {
        self.0.get(address).copied()
    }

    pub fn insert(&mut self, address: impl Into<String>, count: u32) {
        self.0.insert(address.into(), count);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(address, count)| (address.as_str(), *count))
    }

    /// The addresses being counted.
    pub fn addresses(&self) -> AddressSet {
        self.0.keys().map(String::as_str).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for PendingCounters {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        PendingCounters(
            iter.into_iter()
                .map(|(address, count)| (address.into(), count))
                .collect(),
        )
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingDecision {
    /// Addresses to register with the target group.
    pub to_register: AddressSet,
    /// Addresses whose counter reached the threshold.
    pub to_deregister: AddressSet,
    /// Counters to persist for the next invocation.
    pub updated_counters: PendingCounters,
}

/// Addresses visible in DNS that are not registered yet.
pub fn pending_registration(dns: &AddressSet, registered: &AddressSet) -> AddressSet {
    dns.difference(registered)
}

/// Addresses missing from DNS that were active last run or are still
/// registered.
pub fn deregistration_candidates(
    dns: &AddressSet,
    registered: &AddressSet,
    prior_active: &AddressSet,
) -> AddressSet {
    prior_active.difference(dns).union(&registered.difference(dns))
}

/// Advance the per-address invocation counters.
///
/// Candidates seen for the first time start at 1, candidates already
/// counted last run are incremented, and counted addresses that are no
/// longer candidates are dropped.
pub fn pending_deregistration_counters(
    dns: &AddressSet,
    registered: &AddressSet,
    prior_active: &AddressSet,
    prior_counters: &PendingCounters,
) -> PendingCounters {
    deregistration_candidates(dns, registered, prior_active)
        .into_iter()
        .map(|address| {
            let count = prior_counters
                .get(&address)
                .map_or(1, |previous| previous.saturating_add(1));
            (address, count)
        })
        .collect()
}

/// Addresses whose counter reached `threshold`.
pub fn select_deregistration_targets(
    counters: &PendingCounters,
    threshold: NonZeroU32,
) -> AddressSet {
    counters
        .iter()
        .filter(|(_, count)| *count >= threshold.get())
        .map(|(address, _)| address)
        .collect()
}

/// Run the full decision for one invocation.
pub fn reconcile(
    dns: &AddressSet,
    registered: &AddressSet,
    prior_active: &AddressSet,
    prior_counters: &PendingCounters,
    threshold: NonZeroU32,
) -> PendingDecision {
    let to_register = pending_registration(dns, registered);
    let updated_counters =
        pending_deregistration_counters(dns, registered, prior_active, prior_counters);
    let to_deregister = select_deregistration_targets(&updated_counters, threshold);

    PendingDecision {
        to_register,
        to_deregister,
        updated_counters,
    }
}
