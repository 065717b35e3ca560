//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (loader.rs)
//!     → environment overrides (ALB_DNS_NAME, NLB_TG_ARN, ...)
//!     → validation.rs (semantic checks)
//!     → SyncConfig (validated, immutable)
//!     → passed by reference to the driver
//! ```
//!
//! # Design Decisions
//! - Config is built once per process; there is no global state
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::SyncConfig;
pub use schema::{
    DeregistrationConfig, LoadBalancerConfig, LookupConfig, ObservabilityConfig, StateConfig,
    TargetGroupConfig,
};
pub use validation::{config_warnings, ValidationError};
