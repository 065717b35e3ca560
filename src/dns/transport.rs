//! Single DNS queries.

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolveHosts, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::time::timeout;

use crate::dns::DnsError;

/// Issues one query of `record_type` for `name`.
///
/// `nameserver` selects the server to ask; `None` means the system resolver.
/// Results are the textual record values: addresses for A/AAAA, host names
/// for NS.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
        nameserver: Option<IpAddr>,
        timeout: Duration,
    ) -> Result<Vec<String>, DnsError>;
}

/// `DnsTransport` backed by hickory-resolver, without caching.
#[derive(Debug, Clone, Default)]
pub struct HickoryTransport;

impl HickoryTransport {
    pub fn new() -> Self {
        Self
    }

    fn system_resolver(timeout: Duration) -> Result<TokioResolver, String> {
        let mut builder = Resolver::builder_tokio().map_err(|e| e.to_string())?;
        let opts = builder.options_mut();
        opts.cache_size = 0;
        opts.timeout = timeout;
        Ok(builder.build())
    }

    fn single_server_resolver(nameserver: IpAddr, timeout: Duration) -> TokioResolver {
        let addr = SocketAddr::new(nameserver, 53);
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));
        config.add_name_server(NameServerConfig::new(addr, Protocol::Tcp));

        let mut opts = ResolverOpts::default();
        opts.cache_size = 0;
        opts.attempts = 1;
        opts.timeout = timeout;
        opts.use_hosts_file = ResolveHosts::Never;

        Resolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build()
    }
}

#[async_trait]
impl DnsTransport for HickoryTransport {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
        nameserver: Option<IpAddr>,
        limit: Duration,
    ) -> Result<Vec<String>, DnsError> {
        let server = nameserver.map_or_else(|| "system resolver".to_string(), |ip| ip.to_string());
        let failed = |message: String| DnsError::Resolution {
            name: name.to_string(),
            record_type,
            server: server.clone(),
            message,
        };

        let resolver = match nameserver {
            Some(ip) => Self::single_server_resolver(ip, limit),
            None => Self::system_resolver(limit).map_err(failed)?,
        };

        let lookup = match timeout(limit, resolver.lookup(fqdn(name), record_type)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => return Err(failed(e.to_string())),
            Err(_) => {
                return Err(DnsError::Timeout {
                    name: name.to_string(),
                    record_type,
                    server: server.clone(),
                    after: limit,
                })
            }
        };

        Ok(lookup
            .record_iter()
            .filter(|record| record.record_type() == record_type)
            .map(|record| match record.data() {
                RData::A(a) => a.0.to_string(),
                RData::AAAA(aaaa) => aaaa.0.to_string(),
                RData::NS(ns) => ns.0.to_utf8(),
                other => other.to_string(),
            })
            .collect())
    }
}

/// Absolute form of `name`, so search domains never apply.
fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}
