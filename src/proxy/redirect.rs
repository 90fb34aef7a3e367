//! Redirect following for outbound requests.
//!
//! # Responsibilities
//! - Recognize redirect responses
//! - Resolve the `Location` header against the current upstream URL
//! - Re-derive the `host` header for the next hop
//! - Drop caller credentials when a hop leaves the original origin
//!
//! # Design Decisions
//! - The original method is kept on every redirect status, including 301-303
//! - Only requests without a streamed body are re-sent

use axum::http::{
    header::{AUTHORIZATION, COOKIE, LOCATION, PROXY_AUTHORIZATION},
    HeaderMap, HeaderValue, StatusCode,
};
use url::Url;

/// Default hop limit.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Returns true for statuses that carry a followable `Location`.
pub fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Next URL to request, if this response is a redirect with a usable `Location`.
pub fn location_target(current: &Url, status: StatusCode, headers: &HeaderMap) -> Option<Url> {
    if !is_redirect(status) {
        return None;
    }

    let location = headers.get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

/// `host` header value for a redirect hop.
pub fn host_header_for(url: &Url) -> Option<HeaderValue> {
    let host = url.host_str()?;
    let value = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).ok()
}

/// Returns true when `next` differs from `current` in scheme, host or port.
pub fn is_cross_origin(current: &Url, next: &Url) -> bool {
    current.scheme() != next.scheme()
        || current.host_str() != next.host_str()
        || current.port_or_known_default() != next.port_or_known_default()
}

/// Remove headers that carry caller credentials.
pub fn strip_credentials(headers: &mut HeaderMap) {
    headers.remove(AUTHORIZATION);
    headers.remove(COOKIE);
    headers.remove(PROXY_AUTHORIZATION);
}
