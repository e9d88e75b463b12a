//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file, then environment overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → passed explicitly to the route table and forwarder constructors
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Out-of-range migration weights are clamped and reported, never fatal

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigWarning, LoadedConfig};
pub use schema::{
    GatewayConfig, ListenerConfig, LogFormat, MigrationConfig, ObservabilityConfig, PathsConfig,
    ShutdownConfig, TimeoutConfig, UpstreamsConfig,
};
