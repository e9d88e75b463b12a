//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use strangler_gateway::config::GatewayConfig;
use strangler_gateway::http::HttpServer;
use strangler_gateway::lifecycle::Shutdown;
use strangler_gateway::Gateway;

/// A running echo backend.
#[derive(Clone)]
pub struct MockUpstream {
    pub name: &'static str,
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct EchoState {
    name: &'static str,
    hits: Arc<AtomicUsize>,
}

/// Start a backend that answers every request with a JSON description of
/// what it received. POSTs get `201 Created`, everything else `200 OK`.
/// Every response carries `x-backend: <name>`.
pub async fn start_echo_backend(name: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new().fallback(echo).with_state(EchoState {
        name,
        hits: hits.clone(),
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream { name, addr, hits }
}

async fn echo(
    State(state): State<EchoState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let mut header_map = Map::new();
    for (name, value) in headers.iter() {
        header_map.insert(
            name.as_str().to_string(),
            Value::String(value.to_str().unwrap_or_default().to_string()),
        );
    }

    let status = if method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    (
        status,
        [("x-backend", state.name)],
        Json(json!({
            "backend": state.name,
            "method": method.as_str(),
            "uri": uri.to_string(),
            "headers": header_map,
            "body": String::from_utf8_lossy(&body),
        })),
    )
}

/// An address nothing listens on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// What a stalling backend observed on one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallEvent {
    /// A full request head was received.
    Arrived,
    /// The gateway closed the connection before an answer was sent.
    PeerClosed,
    /// The stall elapsed and a response was written.
    Answered,
}

/// A raw-socket backend that holds every request for a fixed time.
pub struct StallingUpstream {
    pub addr: SocketAddr,
    events: mpsc::UnboundedReceiver<StallEvent>,
}

impl StallingUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Next observation, failing the test if none comes within two seconds.
    pub async fn next_event(&mut self) -> StallEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("no upstream event within 2s")
            .expect("stalling backend stopped")
    }
}

/// Start a backend that reads each request head, then waits `stall` before
/// answering `200 OK`, reporting if the peer hangs up first.
pub async fn start_stalling_backend(stall: Duration) -> StallingUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, events) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let mut head = Vec::new();
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => {
                            let _ = tx.send(StallEvent::PeerClosed);
                            return;
                        }
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = tx.send(StallEvent::Arrived);

                tokio::select! {
                    read = socket.read(&mut buf) => {
                        if matches!(read, Ok(0) | Err(_)) {
                            let _ = tx.send(StallEvent::PeerClosed);
                        }
                    }
                    _ = tokio::time::sleep(stall) => {
                        let _ = socket
                            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 4\r\n\r\nslow")
                            .await;
                        let _ = tx.send(StallEvent::Answered);
                    }
                }
            });
        }
    });

    StallingUpstream { addr, events }
}

/// Gateway config pointing at the given base URLs.
pub fn config_for(monolith: &str, movies: &str, events: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.upstreams.monolith_url = monolith.into();
    config.upstreams.movies_url = movies.into();
    config.upstreams.events_url = events.into();
    config.timeouts.connect_secs = 1;
    config.timeouts.request_secs = 2;
    config.shutdown.drain_secs = 2;
    config
}

/// A gateway running on an ephemeral port.
pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the gateway with its default random source.
pub async fn start_gateway(config: GatewayConfig) -> RunningGateway {
    let server = HttpServer::new(config).unwrap();
    spawn_server(server).await
}

/// Start the gateway around a prepared `Gateway` (e.g. seeded randomness).
pub async fn start_gateway_with(config: GatewayConfig, gateway: Gateway) -> RunningGateway {
    spawn_server(HttpServer::with_gateway(config, gateway)).await
}

async fn spawn_server(server: HttpServer) -> RunningGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    RunningGateway {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
