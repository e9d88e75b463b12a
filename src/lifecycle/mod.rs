//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build route table → Bind listener → Announce
//!
//! Shutdown (shutdown.rs, driven by http::server):
//!     Signal received → Stop accepting → Drain in-flight requests
//!         → Deadline: cancel what is left → Release upstream connection pool
//!         → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then routing, then listeners
//! - Ordered shutdown: stop accept, drain, close
//! - Draining has a deadline: in-flight requests are cancelled after it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Cancellation, Shutdown};
pub use startup::StartupError;
