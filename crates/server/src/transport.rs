//! Streamable-HTTP transport: one JSON-RPC message per `POST /mcp`.

use crate::config::HttpConfig;
use abraflexi_mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use abraflexi_mcp::McpServer;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, warn};

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Upper bound on concurrently tracked sessions
const MAX_SESSIONS: usize = 10_000;

struct AppState {
    server: McpServer,
    /// `None` in stateless mode
    sessions: Option<Sessions>,
}

/// Session ids keyed to their last-seen time.
///
/// Sessions idle for longer than `ttl` are dropped on the next access. When
/// the table is full the least recently seen session makes room.
struct Sessions {
    ttl: Duration,
    max: usize,
    seen: Mutex<HashMap<String, Instant>>,
}

impl Sessions {
    fn new(ttl: Duration, max: usize) -> Self {
        Self {
            ttl,
            max,
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn evict_idle(&self, seen: &mut HashMap<String, Instant>, now: Instant) {
        let before = seen.len();
        seen.retain(|_, last| now.duration_since(*last) < self.ttl);
        let evicted = before - seen.len();
        if evicted > 0 {
            debug!(evicted, "Expired idle MCP sessions");
        }
    }

    async fn open(&self) -> String {
        let now = Instant::now();
        let mut seen = self.seen.lock().await;
        self.evict_idle(&mut seen, now);

        while seen.len() >= self.max {
            let Some(oldest) = seen
                .iter()
                .min_by_key(|(_, last)| **last)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            seen.remove(&oldest);
            warn!(session = %oldest, "Session table full, dropped least recently used session");
        }

        let id = uuid::Uuid::new_v4().to_string();
        seen.insert(id.clone(), now);
        id
    }

    /// Refresh a live session; `false` when it is unknown or expired.
    async fn touch(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().await;
        self.evict_idle(&mut seen, now);
        match seen.get_mut(id) {
            Some(last) => {
                *last = now;
                true
            }
            None => false,
        }
    }

    async fn close(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().await;
        self.evict_idle(&mut seen, now);
        seen.remove(id).is_some()
    }
}

/// Bind and serve until Ctrl-C.
pub async fn serve(server: McpServer, config: &HttpConfig) -> Result<()> {
    let app = create_router(server, config);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("MCP endpoint listening on http://{}/mcp", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Create the MCP router
pub fn create_router(server: McpServer, config: &HttpConfig) -> Router {
    let state = AppState {
        server,
        sessions: (!config.stateless).then(|| Sessions::new(config.session_ttl, MAX_SESSIONS)),
    };

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/mcp",
            post(handle_post).get(method_not_allowed).delete(handle_delete),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .with_state(Arc::new(state))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": abraflexi_mcp::server::SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "read_only": state.server.registry().gate().is_read_only(),
        "tools": state.server.registry().len(),
    }))
}

async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

fn rpc_error(status: StatusCode, id: Value, code: i32, message: impl Into<String>) -> Response {
    let error = JsonRpcError {
        code,
        message: message.into(),
        data: None,
    };
    (status, Json(JsonRpcResponse::error(id, error))).into_response()
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn handle_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!("Malformed JSON-RPC body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error())),
            )
                .into_response();
        }
    };
    let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
        Ok(request) => request,
        Err(_) => {
            let id = value.get("id").cloned().unwrap_or(Value::Null);
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(id, JsonRpcError::invalid_request())),
            )
                .into_response();
        }
    };

    let initializing = request.method == "initialize";
    let rpc_id = request.id.clone().unwrap_or(Value::Null);

    if let Some(sessions) = &state.sessions {
        if !initializing {
            let Some(session) = session_id(&headers) else {
                return rpc_error(
                    StatusCode::BAD_REQUEST,
                    rpc_id,
                    JsonRpcError::INVALID_REQUEST,
                    "Missing Mcp-Session-Id header",
                );
            };
            if !sessions.touch(session).await {
                return rpc_error(
                    StatusCode::NOT_FOUND,
                    rpc_id,
                    JsonRpcError::INVALID_REQUEST,
                    "Unknown session",
                );
            }
        }
    }

    let Some(response) = state.server.handle_request(request).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    let mut http_response = Json(&response).into_response();
    if initializing && response.error.is_none() {
        if let Some(sessions) = &state.sessions {
            let session = sessions.open().await;
            info!(session = %session, "MCP session opened");

            if let Ok(value) = HeaderValue::from_str(&session) {
                http_response.headers_mut().insert(SESSION_HEADER, value);
            }
        }
    }
    http_response
}

async fn handle_delete(State(state): State<Arc<AppState>>, headers: HeaderMap) -> StatusCode {
    let Some(sessions) = &state.sessions else {
        return StatusCode::METHOD_NOT_ALLOWED;
    };
    let Some(session) = session_id(&headers) else {
        return StatusCode::BAD_REQUEST;
    };

    if sessions.close(session).await {
        info!(session = %session, "MCP session closed");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abraflexi_core::{AccessGate, InMemoryRecordStore};
    use abraflexi_mcp::{register_all, ToolRegistry};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn http_config(stateless: bool) -> HttpConfig {
        HttpConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            stateless,
            session_ttl: Duration::from_secs(60),
        }
    }

    fn app(stateless: bool) -> Router {
        let mut registry = ToolRegistry::new(AccessGate::read_only());
        register_all(&mut registry, Arc::new(InMemoryRecordStore::new()));
        create_router(McpServer::new(registry), &http_config(stateless))
    }

    fn session_of(response: &Response) -> String {
        response
            .headers()
            .get(SESSION_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    fn post(body: impl Into<String>, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(Body::from(body.into())).unwrap()
    }

    fn delete(session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("DELETE").uri("/mcp");
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"test","version":"1"}}}"#;
    const LIST: &str = r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#;

    #[tokio::test]
    async fn test_health() {
        let response = app(false)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["read_only"], json!(true));
        assert_eq!(body["tools"], json!(21));
    }

    #[tokio::test]
    async fn test_stateful_session_lifecycle() {
        let app = app(false);

        let response = app.clone().oneshot(post(INITIALIZE, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = session_of(&response);
        assert!(uuid::Uuid::parse_str(&session).is_ok());

        let response = app
            .clone()
            .oneshot(post(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, Some(session.as_str())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let response = app.clone().oneshot(post(LIST, Some(session.as_str()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], json!(2));
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 21);

        let response = app.clone().oneshot(delete(Some(session.as_str()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.clone().oneshot(post(LIST, Some(session.as_str()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(delete(Some(session.as_str()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stateful_requires_session_header() {
        let response = app(false).oneshot(post(LIST, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], json!(-32600));

        let response = app(false)
            .oneshot(post(LIST, Some("not-a-session")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stateless_mode() {
        let app = app(true);

        let response = app.clone().oneshot(post(INITIALIZE, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SESSION_HEADER).is_none());

        let response = app.clone().oneshot(post(LIST, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(delete(Some("x"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_malformed_body_and_get() {
        let response = app(true).oneshot(post("{oops", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], json!(-32700));

        let response = app(true)
            .oneshot(Request::builder().uri("/mcp").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_tool_call_over_http() {
        let response = app(true)
            .oneshot(post(
                r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"evidence_list","arguments":{}}}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert_eq!(envelope["success"], json!(true));
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        tokio::time::pause();
        let app = app(false);

        let response = app.clone().oneshot(post(INITIALIZE, None)).await.unwrap();
        let session = session_of(&response);

        tokio::time::advance(Duration::from_secs(45)).await;
        let response = app.clone().oneshot(post(LIST, Some(session.as_str()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // the request above refreshed the session
        tokio::time::advance(Duration::from_secs(45)).await;
        let response = app.clone().oneshot(post(LIST, Some(session.as_str()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::advance(Duration::from_secs(61)).await;
        let response = app.oneshot(post(LIST, Some(session.as_str()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_table_is_bounded() {
        tokio::time::pause();
        let sessions = Sessions::new(Duration::from_secs(60), 2);

        let first = sessions.open().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = sessions.open().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(sessions.touch(&first).await);
        tokio::time::advance(Duration::from_secs(1)).await;

        let third = sessions.open().await;
        assert!(sessions.touch(&first).await);
        assert!(!sessions.touch(&second).await);
        assert!(sessions.touch(&third).await);
        assert_eq!(sessions.seen.lock().await.len(), 2);
    }
}
