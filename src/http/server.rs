//! Development host server.
//!
//! # Responsibilities
//! - Create the Axum Router with a 404 fallback
//! - Layer every configured proxy middleware in declaration order
//! - Bind server to listener and shut down gracefully
//!
//! Static file serving and other host concerns are left to the embedding
//! application; this server only demonstrates the middleware chain.

use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{DevServerConfig, ProxyRuleConfig};
use crate::proxy::{proxy_middleware, ConfigError, ProxyMiddleware};

/// HTTP server hosting the proxy middlewares.
pub struct DevServer {
    router: Router,
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new server, building one middleware per proxy rule.
    pub fn new(config: DevServerConfig) -> Result<Self, ConfigError> {
        let proxies = config
            .proxies
            .iter()
            .map(ProxyRuleConfig::build)
            .collect::<Result<Vec<_>, _>>()?;

        let router = Self::build_router(proxies);
        Ok(Self { router, config })
    }

    /// Build a router where each proxy gets the request before the next one.
    pub fn build_router(proxies: Vec<ProxyMiddleware>) -> Router {
        let mut router = Router::new().fallback(not_found);

        // The last layer added runs first, so add in reverse.
        for proxy in proxies.into_iter().rev() {
            router = router.layer(from_fn_with_state(proxy, proxy_middleware));
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// A clone of the router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &DevServerConfig {
        &self.config
    }

    /// Serve until a shutdown signal is received.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxies = self.config.proxies.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
