//! Strangler Gateway
//!
//! HTTP edge for migrating traffic off a monolith, path by path.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                   STRANGLER GATEWAY                  │
//!                     │                                                      │
//!   Client Request    │  ┌─────────┐    ┌─────────────┐    ┌──────────────┐  │
//!   ──────────────────┼─▶│  http   │───▶│ route table │───▶│   weighted   │  │
//!                     │  │ server  │    │ first match │    │    router    │  │
//!                     │  └─────────┘    └─────────────┘    └──────┬───────┘  │
//!                     │                                           │          │
//!                     │                                           ▼          │
//!   Client Response   │                                    ┌──────────────┐  │
//!   ◀─────────────────┼────────────────────────────────────│  forwarder   │◀─┼── monolith
//!                     │                                    │ (hyper pool) │◀─┼── movies
//!                     │                                    └──────────────┘◀─┼── events
//!                     │                                                      │
//!                     │   config (file + env)    lifecycle    observability  │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use strangler_gateway::config::load_config;
use strangler_gateway::http::HttpServer;
use strangler_gateway::lifecycle::{signals, Shutdown, StartupError};
use strangler_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "strangler-gateway")]
#[command(about = "Routes traffic between a monolith and its extracted services", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding file and environment.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref()).map_err(StartupError::from)?;
    let mut config = loaded.config;
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init(&config.observability)?;
    for warning in &loaded.warnings {
        tracing::warn!(%warning, "Configuration adjusted");
    }

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr).map_err(StartupError::from)?;
    }

    let bind_address = config.listener.bind_address();
    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_listener(shutdown.clone());

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
