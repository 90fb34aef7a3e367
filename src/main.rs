//! dev-proxy: development server that forwards matching requests upstream.
//!
//! ```text
//! client ──▶ listener ──▶ proxy #1 ──▶ proxy #2 ──▶ 404
//!                            │             │
//!                            ▼             ▼
//!                        upstream A    upstream B
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dev_proxy::config::{load_config, validate_config, DevServerConfig, LoadError};
use dev_proxy::lifecycle::signals::shutdown_signal;
use dev_proxy::observability::{logging::init_logging, metrics::init_metrics};
use dev_proxy::{DevServer, Shutdown};

#[derive(Parser)]
#[command(name = "dev-proxy")]
#[command(about = "Development server that proxies matching requests to an upstream", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DevServerConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.listener.bind_address = listen;
        validate_config(&config).map_err(LoadError::Validation)?;
    }

    init_logging(config.observability.log_format);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        proxies = config.proxies.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = DevServer::new(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
