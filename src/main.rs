//! Load balancer target synchronizer.
//!
//! Runs one reconciliation invocation and exits. Schedule it periodically
//! (cron, a systemd timer, a function trigger); invocations for the same
//! target group must not overlap.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌────────────────────────────────────────────────────────────┐
//!   │                      lb-target-sync                        │
//!   │                                                            │
//!   │  ┌──────────┐   ┌──────────────┐   ┌───────────────────┐   │
//!   │  │  config  │──▶│  lifecycle   │──▶│ reconcile engine  │   │
//!   │  └──────────┘   │  (driver)    │   └───────────────────┘   │
//!   │                 └──┬───┬────┬──┘                           │
//!   │                    │   │    │                              │
//!   │        ┌───────────┘   │    └─────────────┐                │
//!   │        ▼               ▼                  ▼                │
//!   │  ┌──────────┐   ┌──────────────┐   ┌──────────────┐        │
//!   │  │   dns    │   │    store     │   │ target_group │        │
//!   │  │ (NS → A) │   │ (state JSON) │   │ (membership) │        │
//!   │  └──────────┘   └──────────────┘   └──────────────┘        │
//!   └────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use lb_target_sync::config::{config_warnings, load_config};
use lb_target_sync::error::SyncError;
use lb_target_sync::lifecycle;
use lb_target_sync::observability::{init_logging, metrics};

#[derive(Parser)]
#[command(name = "lb-target-sync")]
#[command(version, about = "Populate a target group with the IPs behind a load balancer DNS name", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (overrides the configured level; RUST_LOG overrides both).
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_deref());

    let log_level = cli.log_level.clone().unwrap_or_else(|| match &loaded {
        Ok(config) => config.observability.log_level.clone(),
        Err(_) => "info".to_string(),
    });
    if let Err(e) = init_logging(&log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            let err = SyncError::from(e);
            tracing::error!(error = %err, "Invalid configuration");
            return ExitCode::from(err.exit_code());
        }
    };

    tracing::info!(
        dns_name = %config.load_balancer.dns_name,
        listener_port = config.load_balancer.listener_port,
        target_group = %config.target_group.id,
        max_attempts = config.lookup.max_attempts,
        threshold = config.deregistration.threshold,
        "lb-target-sync v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    for warning in config_warnings(&config) {
        tracing::warn!(field = warning.field, "{}", warning.message);
    }

    let push_gateway = config.observability.push_gateway.clone();
    let metrics_handle = match &push_gateway {
        Some(_) => match metrics::init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(error = %e, "Metrics disabled");
                None
            }
        },
        None => None,
    };

    let reconciler = lifecycle::initialize(config);
    let result = reconciler.run().await;

    if let (Some(handle), Some(gateway)) = (&metrics_handle, &push_gateway) {
        if let Err(e) = metrics::push_metrics(handle, gateway).await {
            tracing::error!(error = %e, "Failed to push metrics");
        }
    }

    match result {
        Ok(report) => {
            tracing::info!(
                run_id = %report.run_id,
                registered = report.decision.to_register.len(),
                deregistered = report.decision.to_deregister.len(),
                pending = report.decision.updated_counters.len(),
                "Invocation complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Invocation failed");
            ExitCode::from(e.exit_code())
        }
    }
}
