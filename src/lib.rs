//! Load balancer target synchronizer.
//!
//! Keeps a target group populated with the IP addresses behind a
//! DNS-resolved load balancer. Each invocation discovers addresses from the
//! load balancer's authoritative nameservers, registers new ones right
//! away, and deregisters missing ones only after they have been absent for
//! several consecutive invocations.

pub mod config;
pub mod dns;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod reconcile;
pub mod store;
pub mod target_group;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use lifecycle::Reconciler;
