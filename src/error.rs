//! Invocation-level errors.
//!
//! Only two conditions end an invocation abnormally. Everything else
//! (a failing nameserver, an unreadable state object, a rejected register
//! call) is logged and retried by the next invocation.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that abort a reconciliation invocation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid setting. Raised before any DNS or API call.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// DNS returned no addresses. Nothing was changed.
    #[error(
        "No IP found from DNS for {dns_name}; not making changes to target group {target_group}"
    )]
    FatalEmptyDns {
        dns_name: String,
        target_group: String,
    },
}

impl SyncError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Configuration(_) => 2,
            SyncError::FatalEmptyDns { .. } => 1,
        }
    }
}

/// Result type for invocations.
pub type SyncResult<T> = Result<T, SyncError>;
