//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into a ready gateway
//! - Announce the effective configuration and rule order
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Route table defects surface here, never at request time

use std::net::SocketAddr;

use crate::config::{ConfigError, GatewayConfig};
use crate::routing::{RouteTable, RouteTableError, SplitPolicy};

/// Anything that stops the gateway from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid route table: {0}")]
    Routes(#[from] RouteTableError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Log the effective configuration and the rule order, once.
pub fn announce(config: &GatewayConfig, table: &RouteTable, local_addr: SocketAddr) {
    tracing::info!(
        address = %local_addr,
        monolith_url = %config.upstreams.monolith_url,
        movies_url = %config.upstreams.movies_url,
        events_url = %config.upstreams.events_url,
        gradual_migration = config.migration.gradual,
        movies_migration_percent = config.migration.clamped_percent(),
        connect_timeout_secs = config.timeouts.connect_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "strangler-gateway started"
    );

    for (position, route) in table.routes().iter().enumerate() {
        match &route.policy {
            SplitPolicy::Static(backend) => tracing::info!(
                position,
                route = %route.name,
                prefix = %route.prefix,
                backend = %backend,
                "Route"
            ),
            SplitPolicy::Weighted {
                primary,
                secondary,
                weight,
                enabled,
            } => tracing::info!(
                position,
                route = %route.name,
                prefix = %route.prefix,
                primary = %primary,
                secondary = %secondary,
                weight = weight.percent(),
                enabled,
                "Route"
            ),
        }
    }
}
