//! Repeated lookups that converge on the full record set.
//!
//! A load balancer publishes more addresses than fit in one answer, and
//! each answer is a different sample. Repeating the query and keeping the
//! union converges on the whole set across attempts (and across
//! invocations).

use std::net::IpAddr;

use crate::config::LookupConfig;
use crate::dns::authoritative::AuthoritativeResolver;
use crate::dns::RecordType;
use crate::reconcile::AddressSet;

/// Union of repeated lookups against authoritative nameservers.
#[derive(Clone)]
pub struct ConvergentLookup {
    resolver: AuthoritativeResolver,
    max_attempts: u32,
    full_answer_size: usize,
}

impl ConvergentLookup {
    pub fn new(resolver: AuthoritativeResolver, max_attempts: u32, full_answer_size: usize) -> Self {
        Self {
            resolver,
            max_attempts,
            full_answer_size,
        }
    }

    pub fn from_config(resolver: AuthoritativeResolver, config: &LookupConfig) -> Self {
        Self::new(resolver, config.max_attempts, config.full_answer_size)
    }

    /// Look `name` up repeatedly and return every address seen.
    ///
    /// Stops after `max_attempts`, or as soon as one attempt returns fewer
    /// than `full_answer_size` records. Nameservers that fail are not asked
    /// again. Without nameservers the system resolver is asked exactly once.
    pub async fn lookup_with_retry(
        &self,
        name: &str,
        record_type: RecordType,
        nameservers: Vec<IpAddr>,
    ) -> AddressSet {
        let attempts = if nameservers.is_empty() { 1 } else { self.max_attempts };
        let mut candidates = nameservers;
        let mut found = AddressSet::new();

        for attempt in 1..=attempts {
            let records = match self
                .resolver
                .resolve(name, record_type, std::mem::take(&mut candidates))
                .await
            {
                Ok(resolution) => {
                    candidates = resolution.remaining;
                    resolution.records
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "DNS lookup attempt failed");
                    Vec::new()
                }
            };

            let answered = records.len();
            found.extend(records);
            tracing::info!(
                attempt,
                answered,
                total = found.len(),
                "DNS lookup attempt complete"
            );

            if answered < self.full_answer_size {
                tracing::info!(
                    full_answer_size = self.full_answer_size,
                    "Fewer records than a full answer, stopping further DNS lookups"
                );
                break;
            }
        }

        found
    }

    /// Discover the authoritative nameservers for `dns_name`, then converge
    /// on its addresses against them.
    pub async fn get_elb_ip_from_dns(&self, dns_name: &str, record_type: RecordType) -> AddressSet {
        let nameservers = self.resolver.authoritative_nameservers(dns_name).await;
        self.lookup_with_retry(dns_name, record_type, nameservers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{DnsError, DnsTransport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Returns `per_answer` addresses, different on every call. The `down`
    /// server always fails.
    struct PagingTransport {
        per_answer: usize,
        calls: AtomicUsize,
        down: Option<IpAddr>,
        down_calls: AtomicUsize,
    }

    impl PagingTransport {
        fn new(per_answer: usize) -> Arc<Self> {
            Arc::new(Self {
                per_answer,
                calls: AtomicUsize::new(0),
                down: None,
                down_calls: AtomicUsize::new(0),
            })
        }

        fn with_down(per_answer: usize, down: IpAddr) -> Arc<Self> {
            Arc::new(Self {
                per_answer,
                calls: AtomicUsize::new(0),
                down: Some(down),
                down_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DnsTransport for PagingTransport {
        async fn query(
            &self,
            _name: &str,
            _record_type: RecordType,
            nameserver: Option<IpAddr>,
            _timeout: Duration,
        ) -> Result<Vec<String>, DnsError> {
            if nameserver.is_some() && nameserver == self.down {
                self.down_calls.fetch_add(1, Ordering::SeqCst);
                return Err(DnsError::Resolution {
                    name: "alb.example.com".into(),
                    record_type: RecordType::A,
                    server: format!("{:?}", nameserver),
                    message: "refused".into(),
                });
            }
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.per_answer)
                .map(|i| format!("10.{}.0.{}", call, i))
                .collect())
        }
    }

    fn lookup(transport: Arc<PagingTransport>, max_attempts: u32) -> ConvergentLookup {
        let resolver = AuthoritativeResolver::new(transport, Duration::from_secs(1), Duration::from_secs(10));
        ConvergentLookup::new(resolver, max_attempts, crate::dns::FULL_ANSWER_SIZE)
    }

    fn servers() -> Vec<IpAddr> {
        vec!["205.251.192.1".parse().unwrap(), "205.251.194.2".parse().unwrap()]
    }

    #[tokio::test]
    async fn test_full_answers_use_every_attempt() {
        let transport = PagingTransport::new(8);
        let found = lookup(transport.clone(), 5)
            .lookup_with_retry("alb.example.com", RecordType::A, servers())
            .await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
        assert_eq!(found.len(), 40);
    }

    #[tokio::test]
    async fn test_short_answer_stops_early() {
        let transport = PagingTransport::new(3);
        let found = lookup(transport.clone(), 5)
            .lookup_with_retry("alb.example.com", RecordType::A, servers())
            .await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(found.len(), 3);
    }

    #[tokio::test]
    async fn test_system_resolver_asked_once() {
        let transport = PagingTransport::new(8);
        lookup(transport.clone(), 5)
            .lookup_with_retry("alb.example.com", RecordType::A, Vec::new())
            .await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_server_not_asked_again() {
        let bad: IpAddr = "10.9.9.1".parse().unwrap();
        let good: IpAddr = "10.9.9.2".parse().unwrap();

        // The start rotation is random; repeat so both orders are exercised.
        for _ in 0..20 {
            let transport = PagingTransport::with_down(8, bad);
            let found = lookup(transport.clone(), 5)
                .lookup_with_retry("alb.example.com", RecordType::A, vec![bad, good])
                .await;

            assert!(transport.down_calls.load(Ordering::SeqCst) <= 1);
            assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
            assert_eq!(found.len(), 40);
        }
    }
}
