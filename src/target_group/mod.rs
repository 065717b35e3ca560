//! Target group membership.
//!
//! # Responsibilities
//! - Report the addresses currently registered with a target group
//! - Register and deregister targets
//!
//! # Design Decisions
//! - The driver only sees the `TargetGroupApi` trait; cloud adapters plug
//!   in behind it
//! - `FileTargetGroup` keeps membership in a local JSON registry

pub mod file;

use async_trait::async_trait;
use thiserror::Error;

use crate::reconcile::{AddressSet, Target};

pub use file::FileTargetGroup;

/// Errors from the target group API.
#[derive(Debug, Error)]
pub enum TargetGroupError {
    /// Reading or writing the registry failed.
    #[error("IO error for target group '{target_group}': {source}")]
    Io {
        target_group: String,
        #[source]
        source: std::io::Error,
    },

    /// The registry document is corrupt.
    #[error("Malformed registry for target group '{target_group}': {source}")]
    Malformed {
        target_group: String,
        #[source]
        source: serde_json::Error,
    },

    /// The remote API rejected the call.
    #[error("Target group API error: {0}")]
    Api(String),
}

/// Operations the driver needs from a load balancer target group.
#[async_trait]
pub trait TargetGroupApi: Send + Sync {
    /// Addresses currently registered with `target_group`.
    async fn describe_registered(&self, target_group: &str) -> Result<AddressSet, TargetGroupError>;

    /// Register `targets` with `target_group`.
    async fn register(&self, target_group: &str, targets: &[Target]) -> Result<(), TargetGroupError>;

    /// Deregister `targets` from `target_group`.
    async fn deregister(&self, target_group: &str, targets: &[Target]) -> Result<(), TargetGroupError>;
}
