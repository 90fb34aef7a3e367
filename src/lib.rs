//! Development HTTP proxy middleware.
//!
//! Forwards requests matching a path prefix or pattern to a single upstream,
//! optionally stripping a leading path prefix, and streams the upstream
//! response (with cookie domains removed) back to the caller.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::DevServerConfig;
pub use http::DevServer;
pub use lifecycle::Shutdown;
pub use proxy::{make_proxy, proxy_middleware, ConfigError, Matcher, ProxyMiddleware, ProxyOptions};
