//! OS signal handling.

/// Wait for Ctrl+C.
///
/// If the handler cannot be installed the error is logged and this future
/// never completes, so the server keeps running.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
