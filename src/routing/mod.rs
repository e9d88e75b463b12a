//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered rule lookup, first match wins)
//!     → matcher.rs (segment-boundary prefix check)
//!     → weighted.rs (static backend, or one random draw for a split)
//!     → RoutingDecision { route, backend }
//!
//! Route compilation (at startup):
//!     GatewayConfig
//!     → backends parsed
//!     → rules built in load-bearing order
//!     → validated (catch-all last, no shadowed rules)
//!     → frozen as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Rule order is part of the routing contract
//! - Weighted choices are independent per request

pub mod matcher;
pub mod random;
pub mod router;
pub mod weighted;

pub use matcher::PathPrefix;
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use router::{Route, RouteTable, RouteTableError, RoutingDecision};
pub use weighted::{SplitPolicy, Weight, WeightedRouter};
