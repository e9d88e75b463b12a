//! Upstream services.
//!
//! Each backend is a single opaque HTTP endpoint identified by a base
//! address. There are no pools, no health states and no per-backend
//! connection accounting: one instance per service, shared via `Arc`.

pub mod backend;

pub use backend::{Backend, BackendError};
