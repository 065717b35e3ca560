//! Reconciliation engine.
//!
//! # Data Flow
//! ```text
//! DNS addresses ─┐
//! registered ────┼─→ engine.rs ─→ to_register / to_deregister / counters
//! prior state ───┘        ▲                                   │
//!                         │                                   ▼
//!                   state.rs (decode)                  state.rs (encode)
//!                                                      target.rs (targets)
//! ```
//!
//! # Design Decisions
//! - The engine works on `AddressSet` only; JSON and target lists are
//!   converted at the edges
//! - An address is never both registered and deregistered in one pass

pub mod address_set;
pub mod engine;
pub mod state;
pub mod target;

pub use address_set::AddressSet;
pub use engine::{
    deregistration_candidates, pending_deregistration_counters, pending_registration, reconcile,
    select_deregistration_targets, PendingCounters, PendingDecision,
};
pub use state::{decode_active_state, decode_pending_counters, encode_active_state, ActiveSnapshot};
pub use target::{targets_from_addresses, Target};
