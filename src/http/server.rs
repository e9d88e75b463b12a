//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Dispatch every request to the gateway
//! - Graceful shutdown: stop accepting, drain, cancel stragglers, release
//!   the upstream pool

use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::{Body, BodyDataStream, Bytes},
    extract::{ConnectInfo, OriginalUri, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use futures_util::{Stream, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::gateway::Gateway;
use crate::http::request::{request_id_layer, InboundRequest};
use crate::http::response::shutting_down;
use crate::lifecycle::{startup, Cancellation, StartupError};

/// How long cancelled connections get to flush their last bytes.
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    gateway: Arc<Gateway>,
    config: GatewayConfig,
    cancel: Cancellation,
}

/// State shared by every handler invocation.
#[derive(Clone)]
struct ProxyState {
    gateway: Arc<Gateway>,
    cancel: Cancellation,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let gateway = Gateway::from_config(&config)?;
        Ok(Self::with_gateway(config, gateway))
    }

    /// Create a server around an already-built gateway.
    pub fn with_gateway(config: GatewayConfig, gateway: Gateway) -> Self {
        let gateway = Arc::new(gateway);
        let cancel = Cancellation::new();
        let router = Self::build_router(ProxyState {
            gateway: gateway.clone(),
            cancel: cancel.clone(),
        });
        Self {
            router,
            gateway,
            config,
            cancel,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: ProxyState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for mounting the gateway inside a larger application.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain and release.
    ///
    /// Requests still running `shutdown.drain_secs` after the signal are
    /// cancelled. Returns once the listener is closed, no request is in
    /// flight any more and the upstream pool is gone.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let Self {
            router,
            gateway,
            config,
            cancel,
        } = self;

        let addr = listener.local_addr()?;
        startup::announce(&config, gateway.routes(), addr);

        let drain = Duration::from_secs(config.shutdown.drain_secs);
        let draining = Arc::new(Notify::new());

        let stop_accepting = {
            let draining = draining.clone();
            async move {
                let _ = shutdown.recv().await;
                tracing::info!("No longer accepting connections, draining in-flight requests");
                draining.notify_one();
            }
        };

        let deadline = {
            let draining = draining.clone();
            async move {
                draining.notified().await;
                tokio::time::sleep(drain).await;
            }
        };

        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        let mut serve = Box::pin(
            axum::serve(listener, app)
                .with_graceful_shutdown(stop_accepting)
                .into_future(),
        );

        tokio::select! {
            result = &mut serve => result?,
            _ = deadline => {
                tracing::warn!(
                    drain_secs = config.shutdown.drain_secs,
                    "Drain deadline exceeded, cancelling in-flight requests"
                );
                cancel.cancel();
                match tokio::time::timeout(CANCEL_GRACE, &mut serve).await {
                    Ok(result) => result?,
                    Err(_) => tracing::warn!("Connections still open after cancellation"),
                }
            }
        }
        drop(serve);

        tracing::info!("HTTP server stopped");

        match Arc::try_unwrap(gateway) {
            Ok(gateway) => {
                drop(gateway);
                tracing::info!("Upstream connection pool released");
            }
            Err(_) => {
                tracing::warn!("Upstream connection pool still referenced by a mounted router");
            }
        }

        Ok(())
    }
}

/// Main proxy handler.
///
/// `OriginalUri` is the URI as received, so the full path survives even when
/// this router is nested under a prefix.
async fn proxy_handler(
    State(state): State<ProxyState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    OriginalUri(original_uri): OriginalUri,
    request: Request<Body>,
) -> Response {
    let inbound = InboundRequest::new(&original_uri, client_addr, request);
    let request_id = inbound.request_id().to_string();

    tokio::select! {
        response = state.gateway.handle(inbound) => cancel_body_on_shutdown(response, &state.cancel),
        _ = state.cancel.cancelled() => {
            tracing::warn!(request_id = %request_id, path = %original_uri, "Request cancelled by shutdown");
            shutting_down()
        }
    }
}

/// Keep streaming the upstream body unless shutdown cancels it midway.
fn cancel_body_on_shutdown(response: Response, cancel: &Cancellation) -> Response {
    let (parts, body) = response.into_parts();
    let body = CancellableBody {
        inner: body.into_data_stream(),
        cancelled: Box::pin(cancel.cancelled()),
        done: false,
    };
    Response::from_parts(parts, Body::from_stream(body))
}

/// Response body that ends with an error once cancelled, so the connection
/// is torn down instead of looking like a complete response.
struct CancellableBody {
    inner: BodyDataStream,
    cancelled: Pin<Box<dyn Future<Output = ()> + Send>>,
    done: bool,
}

impl Stream for CancellableBody {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        if self.cancelled.as_mut().poll(cx).is_ready() {
            self.done = true;
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "gateway shutting down",
            ))));
        }

        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(e))) => {
                self.done = true;
                Poll::Ready(Some(Err(io::Error::other(e))))
            }
            Poll::Ready(None) => {
                self.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
