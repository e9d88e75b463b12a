//! Gateway-generated responses.
//!
//! Upstream responses are returned untouched; the only bodies the gateway
//! writes itself are for failed upstream calls and shutdown cancellation.
//!
//! # Design Decisions
//! - Connection failures and broken exchanges result in 502 Bad Gateway
//! - Upstream timeouts result in 504 Gateway Timeout
//! - Requests cancelled at the drain deadline result in 503 Service Unavailable

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::forward::ForwardError;

impl ForwardError {
    /// Status reported to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::InvalidRequest(_)
            | ForwardError::Connect(_)
            | ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let message = match &self {
            ForwardError::Timeout(_) => "Upstream request timed out",
            ForwardError::Connect(_) => "Upstream unreachable",
            ForwardError::InvalidRequest(_) | ForwardError::Upstream(_) => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}

/// Reply for a request cut off by shutdown before its upstream answered.
pub fn shutting_down() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Gateway shutting down").into_response()
}
