//! Error types for proxy construction and request forwarding.
//!
//! # Design Decisions
//! - Construction errors are returned synchronously; no middleware is produced
//! - Transport errors complete the caller's response with a gateway status
//!   instead of leaving the connection open

use std::time::Duration;

use axum::{
    http::{header::InvalidHeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Error raised while building a proxy middleware.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A matcher definition named neither a prefix nor a pattern (or both).
    #[error("matcher must be exactly one of a path prefix or a pattern")]
    InvalidMatcher,

    /// The matcher pattern failed to compile.
    #[error("invalid matcher pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The upstream server address could not be parsed.
    #[error("invalid upstream server `{server}`: {source}")]
    InvalidServer {
        server: String,
        #[source]
        source: url::ParseError,
    },

    /// The upstream server uses a scheme other than http or https.
    #[error("unsupported upstream scheme `{0}`")]
    UnsupportedScheme(String),

    /// The upstream authority cannot be used as a `host` header.
    #[error("upstream host is not a valid header value: {0}")]
    InvalidHostHeader(#[source] InvalidHeaderValue),

    /// The outbound HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Error raised while forwarding a matched request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connection refused, DNS failure, reset, or any other transport failure.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The upstream did not send response headers in time.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// The upstream kept redirecting past the configured limit.
    #[error("upstream exceeded {0} redirects")]
    TooManyRedirects(usize),

    /// The rewritten path produced an address that is not a valid URL.
    #[error("invalid upstream uri `{uri}`: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

impl ProxyError {
    /// Status code reported to the original caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Upstream(_) => "upstream",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::TooManyRedirects(_) => "redirects",
            ProxyError::InvalidUri { .. } => "invalid_uri",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            StatusCode::GATEWAY_TIMEOUT => "Upstream timed out",
            _ => "Upstream request failed",
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProxyError::Timeout(Duration::from_secs(1)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(ProxyError::TooManyRedirects(10).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_into_response_completes_with_gateway_status() {
        let response = ProxyError::TooManyRedirects(3).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
