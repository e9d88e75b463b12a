//! Strangler-fig migration gateway.
//!
//! An HTTP edge that moves traffic from a legacy monolith to extracted
//! services one path prefix at a time, optionally as a weighted canary.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
