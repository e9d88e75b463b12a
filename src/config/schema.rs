//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Base addresses of the upstream services.
    pub upstreams: UpstreamsConfig,

    /// Gradual migration of the movies path.
    pub migration: MigrationConfig,

    /// Path prefixes for the built-in route set.
    pub paths: PathsConfig,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Inbound port.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string to bind to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Upstream base addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    /// Legacy backend, target of the catch-all rule.
    pub monolith_url: String,

    /// Extracted movies service, the migrating backend.
    pub movies_url: String,

    /// Events ingress service.
    pub events_url: String,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            monolith_url: "http://monolith:8080".to_string(),
            movies_url: "http://movies-service:8081".to_string(),
            events_url: "http://events-service:8082".to_string(),
        }
    }
}

/// Migration split settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// When false the movies path is routed to the movies service only.
    pub gradual: bool,

    /// Share of movies traffic (in percent) sent to the movies service.
    /// Values outside 0..=100 are clamped when the route table is built.
    pub percent: i64,
}

impl MigrationConfig {
    /// The configured percentage clamped into `0..=100`.
    pub fn clamped_percent(&self) -> u8 {
        self.percent.clamp(0, 100) as u8
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            gradual: true,
            percent: 0,
        }
    }
}

/// Path prefixes used by the built-in route set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Health endpoint of the movies service. Always routed to it.
    pub movies_health: String,

    /// Generic movies prefix, subject to the weighted split.
    pub movies: String,

    /// Events ingress prefix.
    pub events: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            movies_health: "/api/movies/health".to_string(),
            movies: "/api/movies".to_string(),
            events: "/api/events".to_string(),
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to produce a response head, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Maximum time to wait for in-flight requests once shutdown starts.
    pub drain_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { drain_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
