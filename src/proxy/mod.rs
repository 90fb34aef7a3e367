//! Development proxy middleware.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path?query, headers, body)
//!     → matcher.rs   (prefix or pattern; miss → next handler)
//!     → rewrite.rs   (strip prefix, merge host header)
//!     → target.rs    (compose upstream URI)
//!     → middleware.rs (send, follow redirects via redirect.rs)
//!     → cookies.rs   (drop Domain from set-cookie)
//!     → Streamed response to caller
//! ```
//!
//! # Per-request State Machine
//! ```text
//! UNMATCHED → delegate (terminal)
//! MATCHED → REQUEST_SENT → HEADERS_RECEIVED → STREAMING → DONE
//!                        ↘ TRANSPORT_ERROR → 502/504 (terminal)
//! ```

pub mod cookies;
pub mod error;
pub mod matcher;
pub mod middleware;
pub mod redirect;
pub mod rewrite;
pub mod target;

pub use error::{ConfigError, ProxyError};
pub use matcher::Matcher;
pub use middleware::{make_proxy, proxy_middleware, ProxyMiddleware, ProxyOptions};
pub use target::UpstreamTarget;
