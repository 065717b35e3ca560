//! Authoritative nameserver discovery and rotation.
//!
//! # Responsibilities
//! - Find the nameservers authoritative for a load balancer's region
//! - Query candidate nameservers in rotation until one answers
//! - Drop nameservers that fail, returning the reduced candidate list
//!
//! # Design Decisions
//! - Each server gets a short timeout; the whole call is capped by an
//!   overall deadline no matter how many candidates remain
//! - Servers not tried before the deadline are kept as candidates
//! - An empty candidate list means "ask the system resolver once"

use rand::Rng;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::LookupConfig;
use crate::dns::transport::DnsTransport;
use crate::dns::{DnsError, RecordType};

/// Outcome of one resolve call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Records from the first server that answered (empty if none did).
    pub records: Vec<String>,
    /// Candidates still worth asking on the next call.
    pub remaining: Vec<IpAddr>,
}

/// Queries authoritative nameservers directly.
#[derive(Clone)]
pub struct AuthoritativeResolver {
    transport: Arc<dyn DnsTransport>,
    per_server_timeout: Duration,
    overall_timeout: Duration,
}

impl AuthoritativeResolver {
    pub fn new(transport: Arc<dyn DnsTransport>, per_server_timeout: Duration, overall_timeout: Duration) -> Self {
        Self {
            transport,
            per_server_timeout,
            overall_timeout,
        }
    }

    pub fn from_config(transport: Arc<dyn DnsTransport>, config: &LookupConfig) -> Self {
        Self::new(transport, config.per_server_timeout(), config.overall_timeout())
    }

    /// Resolve `name` against `candidates`.
    ///
    /// With no candidates the system resolver is asked once and its failure
    /// is returned. Otherwise candidates are tried from a random starting
    /// point; failing ones are removed and, if none answers, the records
    /// are empty.
    pub async fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
        candidates: Vec<IpAddr>,
    ) -> Result<Resolution, DnsError> {
        if candidates.is_empty() {
            tracing::info!(name = %name, record_type = %record_type, "No given DNS server, using system resolver");
            let records = self
                .transport
                .query(name, record_type, None, self.overall_timeout)
                .await?;
            return Ok(Resolution {
                records,
                remaining: Vec::new(),
            });
        }

        let mut remaining = candidates;
        let start = rand::thread_rng().gen_range(0..remaining.len());
        remaining.rotate_left(start);

        let deadline = Instant::now() + self.overall_timeout;
        let mut index = 0;
        while index < remaining.len() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                tracing::warn!(
                    name = %name,
                    untried = remaining.len() - index,
                    "DNS lookup deadline reached before any nameserver answered"
                );
                break;
            }

            let nameserver = remaining[index];
            let limit = self.per_server_timeout.min(left);
            match self.transport.query(name, record_type, Some(nameserver), limit).await {
                Ok(records) => {
                    tracing::debug!(name = %name, %nameserver, count = records.len(), "Nameserver answered");
                    return Ok(Resolution { records, remaining });
                }
                Err(e) => {
                    remaining.remove(index);
                    tracing::warn!(
                        %nameserver,
                        remaining = ?remaining,
                        error = %e,
                        "Lookup error with name server, dropping it"
                    );
                }
            }
        }

        Ok(Resolution {
            records: Vec::new(),
            remaining,
        })
    }

    /// IP addresses of the nameservers authoritative for the region of
    /// `dns_name`. Empty when they cannot be discovered.
    ///
    /// The list is not deduplicated: a server reachable under two names is
    /// asked twice as often.
    pub async fn authoritative_nameservers(&self, dns_name: &str) -> Vec<IpAddr> {
        let Some(regional) = regional_name(dns_name) else {
            tracing::warn!(dns_name = %dns_name, "DNS name has no regional parent");
            return Vec::new();
        };
        tracing::info!(regional = %regional, "ELB regional DNS name");

        let ns_names: BTreeSet<String> = match self.resolve(regional, RecordType::NS, Vec::new()).await {
            Ok(resolution) => resolution.records.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to look up authoritative name servers");
                return Vec::new();
            }
        };
        tracing::info!(nameservers = ?ns_names, "Authoritative name server domain set");

        let mut addresses = Vec::new();
        for ns_name in &ns_names {
            match self.resolve(ns_name, RecordType::A, Vec::new()).await {
                Ok(resolution) => addresses.extend(
                    resolution
                        .records
                        .iter()
                        .filter_map(|record| record.parse::<IpAddr>().ok()),
                ),
                Err(e) => {
                    tracing::warn!(nameserver = %ns_name, error = %e, "Failed to resolve name server address");
                }
            }
        }

        tracing::info!(addresses = ?addresses, "Authoritative name server IP list");
        addresses
    }
}

/// Drop the leftmost label: `my-alb-1.us-east-1.elb.amazonaws.com` becomes
/// `us-east-1.elb.amazonaws.com`.
pub fn regional_name(dns_name: &str) -> Option<&str> {
    let (_, rest) = dns_name.split_once('.')?;
    if rest.trim_end_matches('.').is_empty() {
        None
    } else {
        Some(rest)
    }
}
