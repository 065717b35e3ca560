//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lb_target_sync::config::SyncConfig;
use lb_target_sync::dns::{AuthoritativeResolver, ConvergentLookup, DnsError, DnsTransport, RecordType};
use lb_target_sync::observability::MetricsSink;
use lb_target_sync::reconcile::{AddressSet, Target};
use lb_target_sync::store::{ObjectStore, StoreError};
use lb_target_sync::target_group::{TargetGroupApi, TargetGroupError};
use lb_target_sync::Reconciler;

pub const DNS_NAME: &str = "internal-alb-123.us-east-1.elb.amazonaws.com";
pub const TARGET_GROUP: &str = "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/nlb-tg/abc";

/// Config for `DNS_NAME` with the given deregistration threshold.
pub fn test_config(threshold: u32) -> SyncConfig {
    let mut config = SyncConfig::default();
    config.load_balancer.dns_name = DNS_NAME.to_string();
    config.load_balancer.listener_port = 443;
    config.deregistration.threshold = threshold;
    config.state.bucket = "state-bucket".to_string();
    config.target_group.id = TARGET_GROUP.to_string();
    config.lookup.per_server_timeout_ms = 50;
    config.lookup.overall_timeout_ms = 200;
    config
}

pub fn addresses(list: &[&str]) -> AddressSet {
    list.iter().copied().collect()
}

/// DNS transport with a scripted A answer.
///
/// NS discovery always fails, so every invocation makes a single A query
/// through the system resolver path.
#[derive(Default)]
pub struct StubTransport {
    answer: Mutex<Vec<String>>,
    queries: AtomicUsize,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Addresses returned by the next A lookups.
    pub fn set_answer(&self, list: &[&str]) {
        *self.answer.lock().unwrap() = list.iter().map(|a| a.to_string()).collect();
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsTransport for StubTransport {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
        nameserver: Option<IpAddr>,
        _timeout: Duration,
    ) -> Result<Vec<String>, DnsError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match record_type {
            RecordType::A if nameserver.is_none() && name == DNS_NAME => Ok(self.answer.lock().unwrap().clone()),
            _ => Err(DnsError::Resolution {
                name: name.to_string(),
                record_type,
                server: nameserver.map_or_else(|| "system".to_string(), |ns| ns.to_string()),
                message: "NXDOMAIN".to_string(),
            }),
        }
    }
}

pub fn lookup_for(transport: Arc<StubTransport>, config: &SyncConfig) -> ConvergentLookup {
    let resolver = AuthoritativeResolver::from_config(transport, &config.lookup);
    ConvergentLookup::from_config(resolver, &config.lookup)
}

/// In-memory object store that counts calls.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_get: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn json(&self, key: &str) -> Option<serde_json::Value> {
        self.object(key).map(|body| serde_json::from_slice(&body).unwrap())
    }

    pub fn seed(&self, key: &str, body: &[u8]) {
        self.objects.lock().unwrap().insert(key.to_string(), body.to_vec());
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn set_fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
            });
        }
        Ok(self.object(key))
    }

    async fn put(&self, key: &str, body: &[u8]) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.seed(key, body);
        Ok(())
    }
}

/// Target group that records every call.
#[derive(Default)]
pub struct FakeTargetGroup {
    registered: Mutex<AddressSet>,
    register_calls: Mutex<Vec<Vec<Target>>>,
    deregister_calls: Mutex<Vec<Vec<Target>>>,
    describe_calls: AtomicUsize,
    fail_register: AtomicBool,
    fail_describe: AtomicBool,
}

impl FakeTargetGroup {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_registered(list: &[&str]) -> Arc<Self> {
        let group = Self::default();
        *group.registered.lock().unwrap() = addresses(list);
        Arc::new(group)
    }

    pub fn registered(&self) -> AddressSet {
        self.registered.lock().unwrap().clone()
    }

    pub fn register_calls(&self) -> Vec<Vec<Target>> {
        self.register_calls.lock().unwrap().clone()
    }

    pub fn deregister_calls(&self) -> Vec<Vec<Target>> {
        self.deregister_calls.lock().unwrap().clone()
    }

    pub fn describe_count(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_register(&self, fail: bool) {
        self.fail_register.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_describe(&self, fail: bool) {
        self.fail_describe.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TargetGroupApi for FakeTargetGroup {
    async fn describe_registered(&self, _target_group: &str) -> Result<AddressSet, TargetGroupError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_describe.load(Ordering::SeqCst) {
            return Err(TargetGroupError::Api("throttled".to_string()));
        }
        Ok(self.registered())
    }

    async fn register(&self, _target_group: &str, targets: &[Target]) -> Result<(), TargetGroupError> {
        self.register_calls.lock().unwrap().push(targets.to_vec());
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(TargetGroupError::Api("target limit exceeded".to_string()));
        }
        let mut registered = self.registered.lock().unwrap();
        for target in targets {
            registered.insert(target.id.clone());
        }
        Ok(())
    }

    async fn deregister(&self, _target_group: &str, targets: &[Target]) -> Result<(), TargetGroupError> {
        self.deregister_calls.lock().unwrap().push(targets.to_vec());
        let remaining: AddressSet = self
            .registered()
            .iter()
            .filter(|address| !targets.iter().any(|t| t.id == *address))
            .collect();
        *self.registered.lock().unwrap() = remaining;
        Ok(())
    }
}

/// Metrics sink that keeps every published value.
#[derive(Default)]
pub struct RecordingMetrics {
    published: Mutex<Vec<(String, Vec<(String, String)>, u64)>>,
}

impl RecordingMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published(&self) -> Vec<(String, Vec<(String, String)>, u64)> {
        self.published.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingMetrics {
    fn put_count(&self, metric: &str, dimensions: &[(&str, &str)], value: u64) {
        let dimensions = dimensions
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.published
            .lock()
            .unwrap()
            .push((metric.to_string(), dimensions, value));
    }
}

/// A reconciler wired to fakes, plus handles to inspect them.
pub struct Harness {
    pub reconciler: Reconciler,
    pub dns: Arc<StubTransport>,
    pub store: Arc<MemoryStore>,
    pub target_group: Arc<FakeTargetGroup>,
    pub metrics: Arc<RecordingMetrics>,
}

impl Harness {
    pub fn new(config: SyncConfig, target_group: Arc<FakeTargetGroup>) -> Self {
        let dns = StubTransport::new();
        let store = MemoryStore::new();
        let metrics = RecordingMetrics::new();
        let reconciler = Reconciler::new(
            config.clone(),
            lookup_for(dns.clone(), &config),
            store.clone(),
            target_group.clone(),
            metrics.clone(),
        );
        Self {
            reconciler,
            dns,
            store,
            target_group,
            metrics,
        }
    }

    pub fn active_ips(&self) -> Option<AddressSet> {
        let json = self.store.json(&self.reconciler.config().active_state_key())?;
        Some(
            json["IPList"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect(),
        )
    }

    pub fn pending(&self) -> Option<serde_json::Value> {
        self.store.json(&self.reconciler.config().pending_state_key())
    }
}
