//! Persisted state storage.
//!
//! # Data Flow
//! ```text
//! invocation start:  ObjectStore::get("<dns name>/active_ip.json")
//!                    ObjectStore::get("<dns name>/pending_ip.json")
//! invocation end:    ObjectStore::put(...) whole-object overwrite
//! ```
//!
//! # Design Decisions
//! - A missing object is `Ok(None)`, not an error
//! - Writes replace the whole object; there is no locking, so invocations
//!   against the same load balancer must not overlap

pub mod file;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileObjectStore;

/// Errors from the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("IO error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The key cannot be mapped to an object.
    #[error("Invalid object key: '{0}'")]
    InvalidKey(String),
}

/// Key/value blob storage for state objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object. Returns `Ok(None)` if it does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Create or overwrite an object.
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), StoreError>;
}
