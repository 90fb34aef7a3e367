//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the development host
//! server. All types derive Serde traits for deserialization from TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observability::logging::LogFormat;
use crate::proxy::redirect::DEFAULT_MAX_REDIRECTS;
use crate::proxy::{ConfigError, Matcher, ProxyMiddleware, ProxyOptions};

/// Root configuration for the development server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DevServerConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Proxy rules, applied in declaration order.
    pub proxies: Vec<ProxyRuleConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9000".to_string(),
        }
    }
}

/// One proxy middleware instance.
///
/// Exactly one of `prefix` or `pattern` must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyRuleConfig {
    /// Literal URL prefix to match.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Regular expression searched anywhere in the URL.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Upstream server (e.g., "http://localhost:8080").
    pub server: String,

    /// Leading path removed before forwarding.
    #[serde(default)]
    pub strip_prefix: Option<String>,

    #[serde(default = "default_true")]
    pub follow_redirects: bool,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[serde(default = "default_true")]
    pub cookie_jar: bool,

    /// Upstream header timeout in seconds. Unset waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

impl ProxyRuleConfig {
    /// Rule with a prefix matcher and default options.
    pub fn with_prefix(prefix: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            pattern: None,
            server: server.into(),
            strip_prefix: None,
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            cookie_jar: true,
            timeout_secs: None,
        }
    }

    /// Build the matcher this rule describes.
    pub fn matcher(&self) -> Result<Matcher, ConfigError> {
        match (&self.prefix, &self.pattern) {
            (Some(prefix), None) => Ok(Matcher::prefix(prefix.clone())),
            (None, Some(pattern)) => Matcher::pattern(pattern),
            _ => Err(ConfigError::InvalidMatcher),
        }
    }

    pub fn options(&self) -> ProxyOptions {
        ProxyOptions {
            follow_redirects: self.follow_redirects,
            max_redirects: self.max_redirects,
            cookie_jar: self.cookie_jar,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Construct the middleware for this rule.
    pub fn build(&self) -> Result<ProxyMiddleware, ConfigError> {
        ProxyMiddleware::with_options(
            self.matcher()?,
            &self.server,
            self.strip_prefix.as_deref(),
            self.options(),
        )
    }
}
