//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::SyncConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable names, as used by existing deployments.
pub mod env {
    pub const DNS_NAME: &str = "ALB_DNS_NAME";
    pub const LISTENER_PORT: &str = "ALB_LISTENER";
    pub const BUCKET: &str = "S3_BUCKET";
    pub const TARGET_GROUP: &str = "NLB_TG_ARN";
    pub const MAX_LOOKUPS: &str = "MAX_LOOKUP_PER_INVOCATION";
    pub const DEREGISTRATION_THRESHOLD: &str = "INVOCATIONS_BEFORE_DEREGISTRATION";
    pub const IP_COUNT_METRIC: &str = "CW_METRIC_FLAG_IP_COUNT";
    pub const SAME_VPC: &str = "SAME_VPC";
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, overlay the process
/// environment, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => SyncConfig::default(),
    };

    let config = apply_env(config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` returns the value of a variable, or `None` when it is unset.
pub fn apply_env<F>(mut config: SyncConfig, lookup: F) -> Result<SyncConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(env::DNS_NAME) {
        config.load_balancer.dns_name = value;
    }
    if let Some(value) = lookup(env::LISTENER_PORT) {
        config.load_balancer.listener_port = parse_number(env::LISTENER_PORT, &value)?;
    }
    if let Some(value) = lookup(env::BUCKET) {
        config.state.bucket = value;
    }
    if let Some(value) = lookup(env::TARGET_GROUP) {
        config.target_group.id = value;
    }
    if let Some(value) = lookup(env::MAX_LOOKUPS) {
        config.lookup.max_attempts = parse_number(env::MAX_LOOKUPS, &value)?;
    }
    if let Some(value) = lookup(env::DEREGISTRATION_THRESHOLD) {
        config.deregistration.threshold = parse_number(env::DEREGISTRATION_THRESHOLD, &value)?;
    }
    if let Some(value) = lookup(env::IP_COUNT_METRIC) {
        config.observability.ip_count_metric = value.eq_ignore_ascii_case("true");
    }
    if let Some(value) = lookup(env::SAME_VPC) {
        config.target_group.same_vpc = value.eq_ignore_ascii_case("true");
    }
    Ok(config)
}

/// Parse a numeric variable. Negative numbers are reported as invalid
/// values rather than wrapping.
fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env(
            SyncConfig::default(),
            lookup_from(&[
                ("ALB_DNS_NAME", "internal-alb.us-east-1.elb.amazonaws.com"),
                ("ALB_LISTENER", "443"),
                ("S3_BUCKET", "/var/lib/lb-target-sync"),
                ("NLB_TG_ARN", "arn:tg"),
                ("MAX_LOOKUP_PER_INVOCATION", "10"),
                ("INVOCATIONS_BEFORE_DEREGISTRATION", "4"),
                ("CW_METRIC_FLAG_IP_COUNT", "TRUE"),
                ("SAME_VPC", "False"),
            ]),
        )
        .unwrap();

        assert_eq!(config.load_balancer.listener_port, 443);
        assert_eq!(config.lookup.max_attempts, 10);
        assert_eq!(config.deregistration.threshold, 4);
        assert!(config.observability.ip_count_metric);
        assert!(!config.target_group.same_vpc);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_same_vpc_defaults_true() {
        let config = apply_env(SyncConfig::default(), lookup_from(&[])).unwrap();
        assert!(config.target_group.same_vpc);
        assert!(!config.observability.ip_count_metric);
    }

    #[test]
    fn test_negative_threshold_is_invalid() {
        let err = apply_env(
            SyncConfig::default(),
            lookup_from(&[("INVOCATIONS_BEFORE_DEREGISTRATION", "-1")]),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for INVOCATIONS_BEFORE_DEREGISTRATION: '-1'"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(
            &path,
            r#"
            [load_balancer]
            dns_name = "alb-1.eu-west-1.elb.amazonaws.com"
            listener_port = 8443

            [state]
            bucket = "state"

            [target_group]
            id = "tg-1"
            "#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.load_balancer.listener_port, 8443);
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError {
                field: "a",
                message: "x".into(),
            },
            ValidationError {
                field: "b",
                message: "y".into(),
            },
        ]);
        assert_eq!(err.to_string(), "Validation failed: a: x, b: y");
    }
}
