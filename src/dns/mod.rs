//! DNS discovery subsystem.
//!
//! # Data Flow
//! ```text
//! internal-alb-123.us-east-1.elb.amazonaws.com
//!     → authoritative.rs: NS us-east-1.elb.amazonaws.com → A of each NS
//!     → convergent.rs: repeated A lookups against those servers,
//!                      union of every answer
//!     → AddressSet
//! ```
//!
//! # Design Decisions
//! - Query authoritative servers directly; recursive resolvers cache a
//!   single answer page and hide the rest of the record set
//! - A failing nameserver is dropped for the rest of the lookup
//! - Answers shorter than `FULL_ANSWER_SIZE` mean the record set is
//!   exhausted, so the lookup stops early
//! - Nothing in this module fails the invocation; an empty set is the
//!   caller's problem

pub mod authoritative;
pub mod convergent;
pub mod transport;

use std::time::Duration;
use thiserror::Error;

pub use authoritative::{regional_name, AuthoritativeResolver, Resolution};
pub use convergent::ConvergentLookup;
pub use hickory_resolver::proto::rr::RecordType;
pub use transport::{DnsTransport, HickoryTransport};

/// Record count of a full answer page. A shorter answer ends the lookup.
pub const FULL_ANSWER_SIZE: usize = 8;

/// Errors from a single DNS query.
#[derive(Debug, Error)]
pub enum DnsError {
    /// The server answered with an error or could not be reached.
    #[error("{record_type} lookup of {name} via {server} failed: {message}")]
    Resolution {
        name: String,
        record_type: RecordType,
        server: String,
        message: String,
    },

    /// The server did not answer in time.
    #[error("{record_type} lookup of {name} via {server} timed out after {after:?}")]
    Timeout {
        name: String,
        record_type: RecordType,
        server: String,
        after: Duration,
    },
}
