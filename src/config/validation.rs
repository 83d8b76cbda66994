//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts > 0, window > 0)
//! - Validate bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShieldConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ShieldConfig;

/// Longest lifetime an admin action token may be given: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// A single semantic problem in a loaded configuration.
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

/// Check a configuration for values serde cannot reject on its own.
pub fn validate_config(config: &ShieldConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.rate_limit.max_attempts == 0 {
        errors.push(ValidationError::new("rate_limit.max_attempts", "must be at least 1"));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be at least 1"));
    }
    if config.rate_limit.log_capacity == 0 {
        errors.push(ValidationError::new("rate_limit.log_capacity", "must be at least 1"));
    }
    if config.rate_limit.log_key.trim().is_empty() {
        errors.push(ValidationError::new("rate_limit.log_key", "must not be empty"));
    }

    if config.store.purge_interval_secs == 0 {
        errors.push(ValidationError::new("store.purge_interval_secs", "must be at least 1"));
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "must be set when the admin endpoint is enabled",
        ));
    }
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&config.admin.token_ttl_secs) {
        errors.push(ValidationError::new(
            "admin.token_ttl_secs",
            format!("must be between 1 and {}", MAX_TOKEN_TTL_SECS),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
