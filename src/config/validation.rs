//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (the required chain is a configured network)
//! - Validate value ranges and formats (addresses, URLs, poll interval)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PedigreeConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use alloy::primitives::Address;
use url::Url;

use crate::config::schema::PedigreeConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem, naming the offending key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &PedigreeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.registry.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "registry.contract_address",
            format!("`{}` is not an address", config.registry.contract_address),
        ));
    }
    if config.registry.confirmation_poll_ms == 0 {
        errors.push(ValidationError::new(
            "registry.confirmation_poll_ms",
            "must be greater than 0",
        ));
    }

    let networks = config.effective_networks();
    let mut seen = HashSet::new();
    for (i, network) in networks.iter().enumerate() {
        if !seen.insert(network.chain_id) {
            errors.push(ValidationError::new(
                format!("networks[{i}].chain_id"),
                format!("chain {} is listed twice", network.chain_id),
            ));
        }
        if network.chain_id == 0 {
            errors.push(ValidationError::new(format!("networks[{i}].chain_id"), "must not be 0"));
        }
        if let Err(err) = network.rpc_url.parse::<Url>() {
            errors.push(ValidationError::new(
                format!("networks[{i}].rpc_url"),
                format!("`{}`: {err}", network.rpc_url),
            ));
        }
    }

    if !seen.contains(&config.registry.required_chain_id) {
        errors.push(ValidationError::new(
            "registry.required_chain_id",
            format!("chain {} is not a configured network", config.registry.required_chain_id),
        ));
    }
    if let Some(initial) = config.wallet.initial_chain_id {
        if !seen.contains(&initial) {
            errors.push(ValidationError::new(
                "wallet.initial_chain_id",
                format!("chain {initial} is not a configured network"),
            ));
        }
    }
    if config.wallet.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("wallet.private_key_env", "must not be empty"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level `{}`", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
