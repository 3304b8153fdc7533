//! Asset gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                     ASSET GATEWAY                    │
//!                    │                                                      │
//!  Client Request    │  ┌──────────┐   ┌────────────┐   ┌──────────────┐    │
//!  ──────────────────┼─▶│  http    │──▶│ basic auth │──▶│   routing    │    │
//!                    │  │  server  │   │ (optional) │   │   router     │    │
//!                    │  └──────────┘   └────────────┘   └──────┬───────┘    │
//!                    │           ┌─────────────────────────────┼──────┐     │
//!                    │           ▼                             ▼      ▼     │
//!                    │  ┌────────────────┐  ┌───────────────┐ ┌────────┐    │
//!                    │  │ assets handler │  │ proxy         │ │ static │    │
//!                    │  │  + cache       │  │ forwarder     │ │ files  │    │
//!                    │  └───────┬────────┘  └──────┬────────┘ └────────┘    │
//!                    │          ▼                  ▼                        │
//!                    │     asset origins      proxy target ─────────────────┼──▶ Upstream
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use asset_gateway::config::{load_config, GatewayConfig};
use asset_gateway::lifecycle::{signals, Shutdown};
use asset_gateway::observability::{logging, metrics};
use asset_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "asset-gateway")]
#[command(about = "Caching asset gateway and fixed-target reverse proxy", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);

    tracing::info!("asset-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        upstreams = config.assets.upstreams.len(),
        cache_ttl_secs = config.assets.cache_ttl_secs,
        cache_capacity = config.assets.cache_capacity,
        single_flight = config.assets.single_flight,
        auth_enabled = config.auth.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
