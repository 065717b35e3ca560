//! Metrics collection and exposition.
//!
//! # Metrics
//! - `LoadBalancerIPCount` (gauge): addresses found in DNS, labelled with
//!   `LoadBalancerName`
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder it is a no-op
//! - An invocation is short-lived, so the Prometheus exposition is pushed
//!   to a gateway once at the end instead of being scraped

use metrics::Label;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Metric name of the DNS address count.
pub const IP_COUNT_METRIC: &str = "LoadBalancerIPCount";

/// Dimension carrying the load balancer DNS name.
pub const LOAD_BALANCER_DIMENSION: &str = "LoadBalancerName";

/// Job name used in the push gateway URL.
pub const PUSH_JOB: &str = "lb-target-sync";

/// Errors from metrics export.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to install Prometheus recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to push metrics: {0}")]
    Push(#[from] reqwest::Error),
}

/// Destination for count metrics.
pub trait MetricsSink: Send + Sync {
    fn put_count(&self, metric: &str, dimensions: &[(&str, &str)], value: u64);
}

/// `MetricsSink` that records gauges through the `metrics` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn put_count(&self, metric: &str, dimensions: &[(&str, &str)], value: u64) {
        let labels: Vec<Label> = dimensions
            .iter()
            .map(|(key, value)| Label::new(key.to_string(), value.to_string()))
            .collect();
        metrics::gauge!(metric.to_string(), labels).set(value as f64);
    }
}

/// Record the number of addresses found in DNS.
pub fn record_ip_count(sink: &dyn MetricsSink, load_balancer_name: &str, count: usize) {
    sink.put_count(
        IP_COUNT_METRIC,
        &[(LOAD_BALANCER_DIMENSION, load_balancer_name)],
        count as u64,
    );
}

/// Install the Prometheus recorder as the global `metrics` recorder.
pub fn init_metrics() -> Result<PrometheusHandle, MetricsError> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Push the current exposition to a Prometheus push gateway.
pub async fn push_metrics(handle: &PrometheusHandle, gateway: &str) -> Result<(), MetricsError> {
    let url = format!("{}/metrics/job/{}", gateway.trim_end_matches('/'), PUSH_JOB);
    reqwest::Client::new()
        .put(&url)
        .body(handle.render())
        .send()
        .await?
        .error_for_status()?;

    tracing::info!(url = %url, "Pushed metrics");
    Ok(())
}
