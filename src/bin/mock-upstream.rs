//! Stand-in for the services behind the gateway, for local runs.
//!
//! Every role echoes requests as JSON so routing can be observed from the
//! client side. The `events` role additionally speaks the events ingress
//! contract (JSON object in, 201 out, 400 for anything else).

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::{Parser, ValueEnum};
use serde_json::{json, Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    Monolith,
    Movies,
    Events,
}

impl Role {
    fn service(self) -> &'static str {
        match self {
            Role::Monolith => "monolith",
            Role::Movies => "movies-service",
            Role::Events => "events-service",
        }
    }

    fn health_path(self) -> &'static str {
        match self {
            Role::Monolith => "/health",
            Role::Movies => "/api/movies/health",
            Role::Events => "/api/events/health",
        }
    }
}

#[derive(Parser)]
#[command(name = "mock-upstream")]
#[command(about = "Pretend monolith, movies or events service", long_about = None)]
struct Cli {
    #[arg(short, long, value_enum)]
    role: Role,

    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_upstream=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut app = Router::new().route(
        cli.role.health_path(),
        get(|| async { Json(json!({ "status": true })) }),
    );
    if cli.role == Role::Events {
        app = app.route("/api/events/{category}", post(produce_event));
    }
    let app = app.fallback(echo).with_state(cli.role);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(service = cli.role.service(), address = %addr, "mock upstream listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn echo(State(role): State<Role>, method: Method, uri: Uri, headers: HeaderMap) -> Json<Value> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok());

    Json(json!({
        "service": role.service(),
        "method": method.as_str(),
        "uri": uri.to_string(),
        "host": host,
        "x_forwarded_for": forwarded_for,
    }))
}

async fn produce_event(Path(category): Path<String>, body: Bytes) -> impl IntoResponse {
    if !matches!(category.as_str(), "movie" | "user" | "payment") {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Unknown event category" })));
    }

    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => fields,
        _ => return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid JSON body" }))),
    };

    let mut event = Map::new();
    event.insert("type".to_string(), Value::String(category.clone()));
    event.extend(payload);

    let topic = format!("{}-events", category);
    let event = Value::Object(event);
    tracing::info!(topic = %topic, event = %event, "event-produced");

    (StatusCode::CREATED, Json(json!({ "status": "success" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn produce(category: &str, body: &'static str) -> (StatusCode, Value) {
        let response = produce_event(Path(category.to_string()), Bytes::from_static(body.as_bytes()))
            .await
            .into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn json_object_is_accepted() {
        let (status, body) = produce("movie", r#"{"movie_id":7,"action":"viewed"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "status": "success" }));
    }

    #[tokio::test]
    async fn non_object_body_is_rejected() {
        for body in ["not json", "[1,2,3]", "42", ""] {
            let (status, reply) = produce("user", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
            assert_eq!(reply, json!({ "error": "Invalid JSON body" }));
        }
    }

    #[tokio::test]
    async fn unknown_category_is_404() {
        let (status, _) = produce("orders", r#"{"id":1}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn echo_reports_forwarding_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "movies-service:8081".parse().unwrap());
        headers.insert("x-forwarded-for", "10.0.0.1".parse().unwrap());

        let Json(body) = echo(
            State(Role::Movies),
            Method::GET,
            "/api/movies/1?x=y".parse().unwrap(),
            headers,
        )
        .await;

        assert_eq!(body["service"], "movies-service");
        assert_eq!(body["uri"], "/api/movies/1?x=y");
        assert_eq!(body["host"], "movies-service:8081");
        assert_eq!(body["x_forwarded_for"], "10.0.0.1");
    }
}
