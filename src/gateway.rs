//! Per-request composition: route lookup, backend choice, forwarding.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;

use crate::config::GatewayConfig;
use crate::http::forward::RequestForwarder;
use crate::http::request::InboundRequest;
use crate::observability::metrics;
use crate::routing::{RandomSource, RouteTable, RouteTableError, RoutingDecision, ThreadRandom, WeightedRouter};

/// The routing-decision engine plus the forwarder it feeds.
///
/// Shared read-only across all requests; nothing in here changes after
/// construction.
#[derive(Debug)]
pub struct Gateway {
    table: RouteTable,
    router: WeightedRouter,
    forwarder: RequestForwarder,
}

impl Gateway {
    pub fn new(table: RouteTable, router: WeightedRouter, forwarder: RequestForwarder) -> Self {
        Self {
            table,
            router,
            forwarder,
        }
    }

    /// Build the standard rule set with the given random source.
    pub fn with_random(
        config: &GatewayConfig,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self, RouteTableError> {
        Ok(Self::new(
            RouteTable::from_config(config)?,
            WeightedRouter::new(rng),
            RequestForwarder::new(&config.timeouts),
        ))
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteTableError> {
        Self::with_random(config, Arc::new(ThreadRandom))
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Pick the rule and backend for a path.
    pub fn decide(&self, path: &str) -> RoutingDecision<'_> {
        let route = self.table.match_path(path);
        let backend = self.router.choose(&route.policy);
        RoutingDecision { route, backend }
    }

    /// Route and forward one request.
    ///
    /// Upstream failures become 502/504 responses here; nothing propagates
    /// out of a single request.
    pub async fn handle(&self, request: InboundRequest) -> Response<Body> {
        let start = Instant::now();
        let decision = self.decide(request.path());
        let route = decision.route.name.as_str();
        let backend = decision.backend.name();
        let request_id = request.request_id().to_string();
        let path = request.full_path.clone();

        tracing::debug!(
            request_id = %request_id,
            method = %request.method,
            path = %path,
            route = %route,
            backend = %backend,
            "Routing request"
        );

        match self.forwarder.forward(request, decision.backend).await {
            Ok(response) => {
                metrics::record_request(route, backend, response.status().as_u16(), start);
                response
            }
            Err(e) => {
                let status = e.status();
                tracing::warn!(
                    request_id = %request_id,
                    path = %path,
                    route = %route,
                    backend = %decision.backend,
                    kind = e.kind(),
                    status = status.as_u16(),
                    error = %e,
                    "Upstream request failed"
                );
                metrics::record_upstream_error(route, backend, e.kind(), status.as_u16());
                e.into_response()
            }
        }
    }
}
