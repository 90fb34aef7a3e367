//! Upstream target parsing.
//!
//! # Responsibilities
//! - Parse the configured server string once at construction
//! - Fill in defaults (scheme, hostname) without injecting a port
//! - Compose the outbound URI for a rewritten path
//!
//! # Design Decisions
//! - The target's own path is ignored; only the rewritten request path is used
//! - Query and fragment are appended verbatim to every outbound URI
//! - A port equal to the scheme default is dropped

use std::fmt;

use url::Url;

use crate::proxy::error::ConfigError;

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_HOSTNAME: &str = "localhost";

/// Parsed upstream address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// `http` or `https`.
    pub scheme: String,
    pub hostname: String,
    /// `None` when omitted or equal to the scheme default.
    pub port: Option<u16>,
    /// `?...` suffix, empty when absent.
    pub query: String,
    /// `#...` suffix, empty when absent.
    pub fragment: String,
}

impl UpstreamTarget {
    /// Parse a server address such as `http://localhost:8080`.
    ///
    /// A missing scheme defaults to `http` and a missing hostname to
    /// `localhost`, so `:8080` and `localhost:8080` are both accepted.
    pub fn parse(server: &str) -> Result<Self, ConfigError> {
        let trimmed = server.trim();
        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => (DEFAULT_SCHEME.to_string(), trimmed.trim_start_matches("//")),
        };

        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::UnsupportedScheme(scheme));
        }

        let rest = if rest.is_empty() || rest.starts_with([':', '/', '?', '#']) {
            format!("{}{}", DEFAULT_HOSTNAME, rest)
        } else {
            rest.to_string()
        };

        let url = Url::parse(&format!("{}://{}", scheme, rest)).map_err(|source| {
            ConfigError::InvalidServer {
                server: server.to_string(),
                source,
            }
        })?;

        Ok(Self {
            scheme,
            hostname: url.host_str().unwrap_or(DEFAULT_HOSTNAME).to_string(),
            port: url.port(),
            query: url.query().map(|q| format!("?{}", q)).unwrap_or_default(),
            fragment: url.fragment().map(|f| format!("#{}", f)).unwrap_or_default(),
        })
    }

    /// Value for the outbound `host` header: `hostname[:port]`.
    pub fn host_header(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.hostname, port),
            None => self.hostname.clone(),
        }
    }

    /// Outbound URI for a rewritten request path.
    ///
    /// An empty path yields `http://host`, which the URL parser normalizes to
    /// `http://host/` before the request is sent.
    pub fn uri_for(&self, path: &str) -> String {
        format!(
            "{}://{}{}{}{}",
            self.scheme,
            self.host_header(),
            path,
            self.query,
            self.fragment
        )
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host_header())
    }
}
