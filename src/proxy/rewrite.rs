//! Outbound request rewriting.
//!
//! # Responsibilities
//! - Strip the configured leading path prefix
//! - Merge the synthesized `host` header with the caller's headers
//!
//! # Design Decisions
//! - Prefix stripping is an exact leading-string match, applied at most once
//! - Header merge is first-write-wins; the upstream `host` is written first

use axum::http::{header::HOST, HeaderMap, HeaderValue};

/// Remove `prefix` from the start of `url` if present.
pub fn strip_path_prefix<'a>(url: &'a str, prefix: Option<&str>) -> &'a str {
    match prefix {
        Some(prefix) => url.strip_prefix(prefix).unwrap_or(url),
        None => url,
    }
}

/// Build the outbound header set.
///
/// Starts with `host` and copies every incoming header whose name is not
/// already present, keeping all values of multi-valued headers.
pub fn outbound_headers(host: &HeaderValue, incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.keys_len() + 1);
    headers.insert(HOST, host.clone());

    for name in incoming.keys() {
        if headers.contains_key(name) {
            continue;
        }
        for value in incoming.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{ACCEPT, COOKIE};

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_path_prefix("/api/posts", Some("/api")), "/posts");
        assert_eq!(strip_path_prefix("/mount", Some("/mount")), "");
        assert_eq!(strip_path_prefix("/v1/posts", Some("/api")), "/v1/posts");
        assert_eq!(strip_path_prefix("/api/posts", None), "/api/posts");
        // only a leading occurrence is removed
        assert_eq!(strip_path_prefix("/x/api/y", Some("/api")), "/x/api/y");
        assert_eq!(strip_path_prefix("/api/api/y", Some("/api")), "/api/y");
    }

    #[test]
    fn test_host_header_wins() {
        let mut incoming = HeaderMap::new();
        incoming.insert(HOST, HeaderValue::from_static("evil.example"));
        incoming.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let headers = outbound_headers(&HeaderValue::from_static("localhost:8080"), &incoming);

        assert_eq!(headers.get(HOST).unwrap(), "localhost:8080");
        assert_eq!(headers.get_all(HOST).iter().count(), 1);
        assert_eq!(headers.get(ACCEPT).unwrap(), "text/html");
    }

    #[test]
    fn test_multi_valued_headers_copied() {
        let mut incoming = HeaderMap::new();
        incoming.append(COOKIE, HeaderValue::from_static("a=1"));
        incoming.append(COOKIE, HeaderValue::from_static("b=2"));

        let headers = outbound_headers(&HeaderValue::from_static("upstream"), &incoming);

        let cookies: Vec<_> = headers.get_all(COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }
}
