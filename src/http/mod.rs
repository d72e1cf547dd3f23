//! HTTP transport: JSON-RPC over `POST /mcp`, plus health and metrics routes.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mcp::protocol::*;
use crate::mcp::server::McpServer;
use crate::mcp::transport::{decode_message, Message};
use crate::metrics::Metrics;

/// HTTP server state.
#[derive(Clone)]
pub struct HttpState {
    server: Arc<McpServer>,
    metrics: Option<Arc<Metrics>>,
}

impl HttpState {
    /// `metrics` is `None` when the metrics route is disabled.
    pub fn new(server: Arc<McpServer>, metrics: Option<Arc<Metrics>>) -> Self {
        Self { server, metrics }
    }
}

/// Build the router.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/mcp", post(mcp))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and serve until the process exits.
pub async fn start_server(config: &Config, state: HttpState) -> Result<()> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP transport listening on {}", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| Error::HttpServer(e.to_string()))
}

/// Health check endpoint.
async fn health_check(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "server": state.server.name(),
        "version": crate::VERSION,
        "tools": state.server.handler().tool_count(),
    }))
}

/// Prometheus metrics endpoint.
async fn metrics(State(state): State<HttpState>) -> Response {
    match state.metrics {
        Some(ref metrics) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            metrics.to_prometheus(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn parse_error(message: &str) -> Response {
    let body = json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": null,
        "error": JsonRpcError::new(error_codes::PARSE_ERROR, message),
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// JSON-RPC endpoint. Notifications are acknowledged with 202 and no body.
async fn mcp(State(state): State<HttpState>, body: String) -> Response {
    let Some(message) = decode_message(body.trim()) else {
        warn!("Rejecting malformed JSON-RPC body");
        return parse_error("Body is not a JSON-RPC request or notification");
    };

    match message {
        Message::Request(req) => match state.server.handle_request(req, None).await {
            Some(response) => Json(response).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        },
        Message::Notification(notif) => {
            state.server.handle_notification(notif).await;
            StatusCode::ACCEPTED.into_response()
        }
        Message::Response(_) => StatusCode::ACCEPTED.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::handler::McpHandler;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(with_metrics: bool) -> Router {
        let metrics = Metrics::new();
        let server = McpServer::new(McpHandler::new(metrics.clone()), "EntraID MCP Server");
        router(HttpState::new(Arc::new(server), with_metrics.then_some(metrics)))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_mcp(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(false)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["tools"], 0);
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let response = app(true)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("entraid_mcp_tool_calls_total 0"));

        let response = app(false)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_jsonrpc_request() {
        let response = app(false)
            .oneshot(post_mcp(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"], json!({}));
    }

    #[tokio::test]
    async fn test_jsonrpc_notification() {
        let response = app(false)
            .oneshot(post_mcp(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], error_codes::PARSE_ERROR);
        assert!(body["id"].is_null());
    }
}
