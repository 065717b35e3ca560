//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts > 0, threshold > 0, port > 0)
//! - Check the DNS name has a regional parent to query NS records for
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>
//! - Runs before any DNS or target group call is made

use thiserror::Error;

use crate::config::schema::SyncConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let dns_name = config.load_balancer.dns_name.trim_end_matches('.');
    if dns_name.is_empty() {
        errors.push(ValidationError::new("load_balancer.dns_name", "is required"));
    } else if !dns_name.contains('.') {
        errors.push(ValidationError::new(
            "load_balancer.dns_name",
            format!("'{}' has no regional parent domain", dns_name),
        ));
    }

    if config.load_balancer.listener_port == 0 {
        errors.push(ValidationError::new(
            "load_balancer.listener_port",
            "is required to be a positive number",
        ));
    }

    let record_type = &config.load_balancer.record_type;
    if !record_type.eq_ignore_ascii_case("A") && !record_type.eq_ignore_ascii_case("AAAA") {
        errors.push(ValidationError::new(
            "load_balancer.record_type",
            format!("'{}' is not one of A, AAAA", record_type),
        ));
    }

    if config.lookup.max_attempts == 0 {
        errors.push(ValidationError::new(
            "lookup.max_attempts",
            "is required to be a positive number",
        ));
    }

    if config.lookup.full_answer_size == 0 {
        errors.push(ValidationError::new(
            "lookup.full_answer_size",
            "is required to be a positive number",
        ));
    }

    if config.lookup.per_server_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "lookup.per_server_timeout_ms",
            "is required to be a positive number",
        ));
    }

    if config.lookup.overall_timeout_ms < config.lookup.per_server_timeout_ms {
        errors.push(ValidationError::new(
            "lookup.overall_timeout_ms",
            "must not be shorter than lookup.per_server_timeout_ms",
        ));
    }

    if config.deregistration.threshold == 0 {
        errors.push(ValidationError::new(
            "deregistration.threshold",
            "is required to be a positive number",
        ));
    }

    if config.state.bucket.is_empty() {
        errors.push(ValidationError::new("state.bucket", "is required"));
    }

    if config.target_group.id.is_empty() {
        errors.push(ValidationError::new("target_group.id", "is required"));
    }

    if let Some(gateway) = &config.observability.push_gateway {
        if reqwest::Url::parse(gateway).is_err() {
            errors.push(ValidationError::new(
                "observability.push_gateway",
                format!("'{}' is not a valid URL", gateway),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Settings that are valid but will not do what the operator likely wants.
pub fn config_warnings(config: &SyncConfig) -> Vec<ValidationError> {
    let mut warnings = Vec::new();

    if config.observability.ip_count_metric && config.observability.push_gateway.is_none() {
        warnings.push(ValidationError::new(
            "observability.ip_count_metric",
            "is enabled without a push_gateway; the metric is not exported",
        ));
    }

    warnings
}
