//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the DNS, storage and target group collaborators from config
//! - Hand them to a `Reconciler`
//!
//! # Design Decisions
//! - Config must already be validated; nothing here re-checks it
//! - Subsystems initialize in order: DNS, storage, target group, metrics

use std::sync::Arc;

use crate::config::SyncConfig;
use crate::dns::{AuthoritativeResolver, ConvergentLookup, HickoryTransport};
use crate::lifecycle::invocation::Reconciler;
use crate::observability::PrometheusSink;
use crate::store::FileObjectStore;
use crate::target_group::FileTargetGroup;

/// Build a reconciler backed by hickory DNS and the file adapters.
pub fn initialize(config: SyncConfig) -> Reconciler {
    let resolver = AuthoritativeResolver::from_config(Arc::new(HickoryTransport::new()), &config.lookup);
    let lookup = ConvergentLookup::from_config(resolver, &config.lookup);

    let store = Arc::new(FileObjectStore::new(&config.state.bucket));
    let target_group = Arc::new(FileTargetGroup::new(&config.target_group.registry_dir));

    tracing::info!(
        bucket = %config.state.bucket,
        registry_dir = %config.target_group.registry_dir,
        "Collaborators initialized"
    );

    Reconciler::new(config, lookup, store, target_group, Arc::new(PrometheusSink))
}
