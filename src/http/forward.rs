//! Upstream request forwarding.
//!
//! # Responsibilities
//! - Address the chosen backend with the request's full original path
//! - Rewrite `Host` to the backend authority, append `X-Forwarded-*`
//! - Stream the request body up and the response back without buffering
//! - Classify upstream failures for the client
//!
//! # Design Decisions
//! - One attempt per request: no retry, no failover to another backend
//! - The deadline covers connect + send + response head; the body streams
//!   after that without a gateway-imposed limit
//! - Dropping the returned future (client went away) drops the upstream
//!   request and its connection

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::http::headers::{append_forwarded, strip_hop_by_hop};
use crate::http::request::InboundRequest;
use crate::upstream::Backend;

/// Why an upstream call produced no response.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("could not build upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    #[error("failed to connect to upstream: {0}")]
    Connect(#[source] hyper_util::client::legacy::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidRequest(_) => "invalid_request",
            ForwardError::Connect(_) => "connect",
            ForwardError::Upstream(_) => "upstream",
            ForwardError::Timeout(_) => "timeout",
        }
    }
}

/// Executes upstream calls over a shared connection pool.
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
}

impl RequestForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        }
    }

    /// Send `inbound` to `backend` and hand back its response unchanged.
    pub async fn forward(
        &self,
        inbound: InboundRequest,
        backend: &Backend,
    ) -> Result<Response<Body>, ForwardError> {
        let InboundRequest {
            method,
            full_path,
            mut headers,
            body,
            client_addr,
            host,
        } = inbound;

        strip_hop_by_hop(&mut headers);
        append_forwarded(&mut headers, client_addr.ip(), "http", host.as_deref());
        headers.insert(header::HOST, backend.host_header().clone());

        let uri = backend.upstream_uri(&full_path)?;

        // Version is left at the client default (HTTP/1.1) whatever the
        // inbound protocol was.
        let mut request = Request::builder().method(method).uri(uri).body(body)?;
        *request.headers_mut() = headers;

        let response = match tokio::time::timeout(self.request_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_connect() => return Err(ForwardError::Connect(e)),
            Ok(Err(e)) => return Err(ForwardError::Upstream(e)),
            Err(_) => return Err(ForwardError::Timeout(self.request_timeout)),
        };

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
