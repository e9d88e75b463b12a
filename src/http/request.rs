//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Capture everything forwarding needs from an inbound request, once
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The full path is taken from the URI the gateway received, before any
//!   router nesting strips a mount prefix, and carried by value from there on

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header, uri::PathAndQuery, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Sets `x-request-id` on inbound requests that lack one.
pub type RequestIdLayer = SetRequestIdLayer<MakeRequestUuid>;

pub fn request_id_layer() -> RequestIdLayer {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// An inbound request with its resolved full path.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    /// Path and query exactly as the client sent them to the gateway.
    pub full_path: PathAndQuery,
    pub headers: HeaderMap,
    pub body: Body,
    pub client_addr: SocketAddr,
    /// Host the client addressed, from the `Host` header or the URI authority.
    pub host: Option<String>,
}

impl InboundRequest {
    /// Build from the request as received. `original_uri` must be the URI
    /// before any nested router rewrote it.
    pub fn new(original_uri: &Uri, client_addr: SocketAddr, request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();

        let full_path = original_uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| original_uri.authority().map(|a| a.to_string()))
            .or_else(|| parts.uri.authority().map(|a| a.to_string()));

        Self {
            method: parts.method,
            full_path,
            headers: parts.headers,
            body,
            client_addr,
            host,
        }
    }

    /// Path component used for route matching.
    pub fn path(&self) -> &str {
        self.full_path.path()
    }

    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}
