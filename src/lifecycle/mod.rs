//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → DNS transport → store → target group → Reconciler
//!
//! Invocation (invocation.rs):
//!     prior state → DNS discovery → target group → decision
//!     → register / deregister → persist state
//! ```
//!
//! # Design Decisions
//! - One invocation per process; the scheduler that starts the process
//!   must not overlap invocations for the same target group
//! - Fail fast on configuration errors, before any DNS or API call

pub mod invocation;
pub mod startup;

pub use invocation::{CallOutcome, InvocationReport, Reconciler};
pub use startup::initialize;
