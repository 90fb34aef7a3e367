//! The proxy middleware and its factory.
//!
//! # Responsibilities
//! - Build an immutable proxy configuration once (`make_proxy`)
//! - Delegate unmatched requests to the next handler untouched
//! - Rewrite, forward and stream matched requests to the upstream
//! - Relay status, headers (cookie domains stripped) and body back
//!
//! # Design Decisions
//! - Configuration is shared through an `Arc` and never mutated
//! - Request and response bodies are streamed, never buffered
//! - Transport failures complete the response with 502/504
//! - Redirects are followed here so the method survives every hop

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{header::HOST, HeaderValue, Request, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use url::Url;

use crate::observability::metrics;
use crate::proxy::cookies::rewrite_set_cookie_headers;
use crate::proxy::error::{ConfigError, ProxyError};
use crate::proxy::matcher::Matcher;
use crate::proxy::redirect::{
    host_header_for, is_cross_origin, location_target, strip_credentials, DEFAULT_MAX_REDIRECTS,
};
use crate::proxy::rewrite::{outbound_headers, strip_path_prefix};
use crate::proxy::target::UpstreamTarget;

/// Optional behavior of a proxy instance.
#[derive(Debug, Clone)]
pub struct ProxyOptions {
    /// Follow upstream redirects, keeping the original method.
    pub follow_redirects: bool,
    /// Maximum redirect hops before failing with 502.
    pub max_redirects: usize,
    /// Keep a cookie jar shared by all requests through this instance.
    pub cookie_jar: bool,
    /// Deadline for upstream response headers, measured once from the start
    /// of forwarding and shared by every redirect hop. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            cookie_jar: true,
            timeout: None,
        }
    }
}

#[derive(Debug)]
struct ProxyConfig {
    matcher: Matcher,
    target: UpstreamTarget,
    strip_prefix: Option<String>,
    host_header: HeaderValue,
    options: ProxyOptions,
}

/// A configured proxy middleware.
///
/// Cheap to clone; every clone shares the same configuration and client.
#[derive(Debug, Clone)]
pub struct ProxyMiddleware {
    config: Arc<ProxyConfig>,
    client: reqwest::Client,
}

/// Create a proxy middleware with default options.
///
/// ```ignore
/// let proxy = make_proxy("/api/posts", "http://localhost:8080", Some("/api"))?;
/// let app = Router::new()
///     .fallback(static_files)
///     .layer(axum::middleware::from_fn_with_state(proxy, proxy_middleware));
/// ```
pub fn make_proxy(
    matcher: impl Into<Matcher>,
    server: &str,
    strip_prefix: Option<&str>,
) -> Result<ProxyMiddleware, ConfigError> {
    ProxyMiddleware::with_options(matcher, server, strip_prefix, ProxyOptions::default())
}

/// Middleware function for `axum::middleware::from_fn_with_state`.
pub async fn proxy_middleware(
    State(proxy): State<ProxyMiddleware>,
    request: Request<Body>,
    next: Next,
) -> Response {
    proxy.handle(request, next).await
}

impl ProxyMiddleware {
    /// Create a proxy middleware with explicit options.
    pub fn with_options(
        matcher: impl Into<Matcher>,
        server: &str,
        strip_prefix: Option<&str>,
        options: ProxyOptions,
    ) -> Result<Self, ConfigError> {
        let matcher = matcher.into();
        let target = UpstreamTarget::parse(server)?;
        let host_header =
            HeaderValue::from_str(&target.host_header()).map_err(ConfigError::InvalidHostHeader)?;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .cookie_store(options.cookie_jar)
            .build()
            .map_err(ConfigError::Client)?;

        tracing::debug!(
            matcher = %matcher,
            upstream = %target,
            strip_prefix = ?strip_prefix,
            "Proxy configured"
        );

        Ok(Self {
            config: Arc::new(ProxyConfig {
                matcher,
                target,
                strip_prefix: strip_prefix.map(str::to_string),
                host_header,
                options,
            }),
            client,
        })
    }

    pub fn matcher(&self) -> &Matcher {
        &self.config.matcher
    }

    pub fn target(&self) -> &UpstreamTarget {
        &self.config.target
    }

    pub fn strip_prefix(&self) -> Option<&str> {
        self.config.strip_prefix.as_deref()
    }

    pub fn options(&self) -> &ProxyOptions {
        &self.config.options
    }

    /// Returns true if this proxy takes ownership of the request.
    pub fn matches<B>(&self, request: &Request<B>) -> bool {
        self.config.matcher.matches(request_url(request.uri()))
    }

    /// Outbound URI for a request URL, after prefix stripping.
    ///
    /// A remainder that does not start a path or query (`/apix` stripped of
    /// `/api`) is rooted with `/` so it can never extend the authority.
    pub fn upstream_uri(&self, url: &str) -> String {
        let path = strip_path_prefix(url, self.strip_prefix());
        if path.is_empty() || path.starts_with(['/', '?']) {
            self.config.target.uri_for(path)
        } else {
            self.config.target.uri_for(&format!("/{}", path))
        }
    }

    /// Proxy the request if it matches, otherwise run `next`.
    pub async fn handle(&self, request: Request<Body>, next: Next) -> Response {
        if !self.matches(&request) {
            tracing::trace!(
                method = %request.method(),
                path = %request_url(request.uri()),
                "Not matched, delegating"
            );
            metrics::record_delegated();
            return next.run(request).await;
        }

        let method = request.method().clone();
        let path = request_url(request.uri()).to_string();

        match self.forward(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    upstream = %self.config.target,
                    error = %e,
                    "Upstream error"
                );
                metrics::record_error(e.kind());
                e.into_response()
            }
        }
    }

    /// Forward a request to the upstream unconditionally.
    ///
    /// The returned response has its status and headers fixed; its body
    /// streams from the upstream as chunks arrive.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response, ProxyError> {
        let start = Instant::now();
        let deadline = self
            .config
            .options
            .timeout
            .map(|limit| (tokio::time::Instant::from_std(start) + limit, limit));
        let (parts, body) = request.into_parts();

        let uri = self.upstream_uri(request_url(&parts.uri));
        let mut upstream = Url::parse(&uri).map_err(|source| ProxyError::InvalidUri {
            uri: uri.clone(),
            source,
        })?;
        let mut headers = outbound_headers(&self.config.host_header, &parts.headers);

        // A body that is already at end of stream can be re-sent on redirect.
        let mut streamed = if body.is_end_stream() {
            None
        } else {
            Some(reqwest::Body::wrap_stream(body.into_data_stream()))
        };
        let replayable = streamed.is_none();
        let mut redirects = 0;

        tracing::debug!(
            method = %parts.method,
            path = %parts.uri,
            upstream = %upstream,
            "Proxying request"
        );

        loop {
            let mut outbound = self
                .client
                .request(parts.method.clone(), upstream.clone())
                .headers(headers.clone());
            if let Some(body) = streamed.take() {
                outbound = outbound.body(body);
            }

            let response = send(outbound, deadline).await?;

            if self.config.options.follow_redirects {
                if let Some(next_url) =
                    location_target(&upstream, response.status(), response.headers())
                {
                    if !replayable {
                        tracing::debug!(
                            status = response.status().as_u16(),
                            location = %next_url,
                            "Request body was streamed, relaying redirect"
                        );
                    } else if redirects >= self.config.options.max_redirects {
                        return Err(ProxyError::TooManyRedirects(redirects));
                    } else {
                        redirects += 1;
                        tracing::debug!(
                            status = response.status().as_u16(),
                            location = %next_url,
                            hop = redirects,
                            "Following redirect"
                        );
                        if is_cross_origin(&upstream, &next_url) {
                            strip_credentials(&mut headers);
                        }
                        if let Some(host) = host_header_for(&next_url) {
                            headers.insert(HOST, host);
                        }
                        upstream = next_url;
                        continue;
                    }
                }
            }

            tracing::info!(
                method = %parts.method,
                path = %parts.uri,
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Upstream responded"
            );
            metrics::record_proxied(parts.method.as_str(), response.status().as_u16(), start);

            return Ok(relay(response));
        }
    }
}

/// Send one hop, bounded by the forwarding deadline if there is one.
async fn send(
    request: reqwest::RequestBuilder,
    deadline: Option<(tokio::time::Instant, Duration)>,
) -> Result<reqwest::Response, ProxyError> {
    match deadline {
        Some((at, limit)) => tokio::time::timeout_at(at, request.send())
            .await
            .map_err(|_| ProxyError::Timeout(limit))?
            .map_err(ProxyError::from),
        None => Ok(request.send().await?),
    }
}

/// Turn an upstream response into a streaming response for the caller.
fn relay(response: reqwest::Response) -> Response {
    let status = response.status();
    let mut headers = response.headers().clone();
    rewrite_set_cookie_headers(&mut headers);

    let body = response
        .bytes_stream()
        .inspect_err(|e| tracing::warn!(error = %e, "Upstream body stream failed"));

    let mut relayed = Response::new(Body::from_stream(body));
    *relayed.status_mut() = status;
    *relayed.headers_mut() = headers;
    relayed
}

/// The request URL as the host server sees it: path plus query.
fn request_url(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_uri_strips_prefix() {
        let proxy = make_proxy("/api/posts", "http://localhost:8080", Some("/api")).unwrap();
        assert_eq!(proxy.upstream_uri("/api/posts"), "http://localhost:8080/posts");
        assert_eq!(proxy.upstream_uri("/api/posts?page=2"), "http://localhost:8080/posts?page=2");
    }

    #[test]
    fn test_upstream_uri_without_strip_prefix() {
        let proxy = make_proxy(Matcher::pattern("^/svc/").unwrap(), "http://localhost:9000", None)
            .unwrap();
        assert_eq!(proxy.upstream_uri("/svc/users/5"), "http://localhost:9000/svc/users/5");
    }

    #[test]
    fn test_upstream_uri_prefix_not_leading() {
        let proxy = make_proxy("/v1", "http://localhost:9000", Some("/api")).unwrap();
        assert_eq!(proxy.upstream_uri("/v1/api/x"), "http://localhost:9000/v1/api/x");
    }

    #[test]
    fn test_remainder_cannot_extend_authority() {
        let proxy = make_proxy("/api", "http://backend", Some("/api")).unwrap();
        assert_eq!(proxy.upstream_uri("/api.evil.com/x"), "http://backend/.evil.com/x");
        assert_eq!(proxy.upstream_uri("/apix"), "http://backend/x");
        assert_eq!(proxy.upstream_uri("/api?q=1"), "http://backend?q=1");

        let with_port = make_proxy("/api", "http://backend:8080", Some("/api")).unwrap();
        let uri = with_port.upstream_uri("/api.evil.com/x");
        assert_eq!(Url::parse(&uri).unwrap().host_str(), Some("backend"));
    }

    #[test]
    fn test_exact_mount_strips_to_root() {
        let proxy = make_proxy("/mount", "http://upstream:80", Some("/mount")).unwrap();
        let uri = proxy.upstream_uri("/mount");
        assert_eq!(uri, "http://upstream");
        assert_eq!(Url::parse(&uri).unwrap().path(), "/");
    }

    #[test]
    fn test_matches_uses_path_and_query() {
        let proxy = make_proxy(Matcher::pattern(r"format=json").unwrap(), "http://localhost", None)
            .unwrap();
        let request = Request::builder()
            .uri("/report?format=json")
            .body(Body::empty())
            .unwrap();
        assert!(proxy.matches(&request));
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            make_proxy("/api", "gopher://old.host", None),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            make_proxy("/api", "http://[::1", None),
            Err(ConfigError::InvalidServer { .. })
        ));
    }

    #[test]
    fn test_default_options() {
        let proxy = make_proxy("/", "localhost:3000", None).unwrap();
        assert!(proxy.options().follow_redirects);
        assert!(proxy.options().cookie_jar);
        assert_eq!(proxy.options().max_redirects, DEFAULT_MAX_REDIRECTS);
        assert!(proxy.options().timeout.is_none());
        assert_eq!(proxy.target().host_header(), "localhost:3000");
    }
}
