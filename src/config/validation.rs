//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every proxy rule names exactly one matcher kind with a valid pattern
//! - Every upstream server parses
//! - Listener and (when enabled) metrics addresses are socket addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::DevServerConfig;
use crate::proxy::{ConfigError, UpstreamTarget};

/// A single semantic problem in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{address}` is not a socket address")]
    BindAddress { address: String },

    #[error("observability.metrics_address `{address}` is not a socket address")]
    MetricsAddress { address: String },

    #[error("proxies[{index}]: {source}")]
    Proxy {
        index: usize,
        #[source]
        source: ConfigError,
    },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &DevServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress {
            address: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress {
            address: config.observability.metrics_address.clone(),
        });
    }

    for (index, rule) in config.proxies.iter().enumerate() {
        if let Err(source) = rule.matcher() {
            errors.push(ValidationError::Proxy { index, source });
        }
        if let Err(source) = UpstreamTarget::parse(&rule.server) {
            errors.push(ValidationError::Proxy { index, source });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
