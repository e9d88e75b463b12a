//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (capture method, full original path, headers, body)
//!     → [gateway picks route and backend]
//!     → forward.rs + headers.rs (rewrite addressing, call upstream)
//!     → response.rs (only for failed upstream calls)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardError, RequestForwarder};
pub use request::{InboundRequest, RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
