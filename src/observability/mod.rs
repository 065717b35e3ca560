//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every step of an invocation produces:
//!     → logging.rs (structured log events inside an `invocation` span)
//!     → metrics.rs (LoadBalancerIPCount gauge)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Prometheus push gateway (optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{MetricsSink, PrometheusSink};
