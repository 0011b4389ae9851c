/// HTTP surface of the server
///
/// One axum router carries the MCP event stream, the JSON-RPC submission
/// endpoint and the REST facades for browser clients.

pub mod error;
pub mod sessions;
pub mod sse;

pub use error::ApiError;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::completion::CompletionClient;
use crate::config::SSE_PATH;
use crate::mcp::{ConnectionRegistry, McpServer};
use crate::storage::DocumentStorage;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn DocumentStorage>,
    pub connections: ConnectionRegistry,
    pub mcp: McpServer,
    pub completion: Arc<dyn CompletionClient>,
    /// Announced to every new connection in its `endpoint` event
    pub message_path: Arc<str>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn DocumentStorage>,
        connections: ConnectionRegistry,
        completion: Arc<dyn CompletionClient>,
        message_path: &str,
    ) -> Self {
        Self {
            mcp: McpServer::new(storage.clone()),
            storage,
            connections,
            completion,
            message_path: Arc::from(message_path),
        }
    }
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let message_path = state.message_path.to_string();

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(health))
        .route(SSE_PATH, get(sse::open_stream))
        .route(&message_path, post(sse::submit_message))
        .route("/session", post(sessions::create_session))
        .route("/session/:sid/upload", post(sessions::upload_document))
        .route("/session/:sid/query", post(sessions::query_document))
        .route("/session/:sid/history", get(sessions::session_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn root() -> &'static str {
    "MCP server OK"
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.storage.list_sessions().len(),
        "connections": state.connections.connection_count(),
    }))
}
