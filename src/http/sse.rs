/// MCP over Server-Sent Events
///
/// `GET` on the stream path opens a connection and keeps it open; `POST` on
/// the message path carries one JSON-RPC request for a named connection.
/// The POST only acknowledges receipt. The JSON-RPC response is produced in
/// a background task and published on the connection's stream.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::ConnectionId;
use crate::http::{ApiError, AppState};
use crate::mcp::protocol::JsonRpcRequest;
use crate::mcp::{ConnectionRegistry, McpServer, TransportError};

/// Query string of a submission
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// Connection the submission acts for
    #[serde(rename = "sessionId")]
    pub connection_id: Option<String>,
}

/// Open a connection and stream its events
pub async fn open_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.connections.open(&state.message_path);

    let events = stream.map(|event| {
        Ok::<_, Infallible>(
            Event::default()
                .event(event.event_name())
                .data(event.data()),
        )
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Accept one JSON-RPC submission for an open connection
pub async fn submit_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let raw = query
        .connection_id
        .ok_or_else(|| ApiError::BadRequest("Missing sessionId query parameter".to_string()))?;

    let connection_id = ConnectionId::from_string(&raw)
        .map_err(|_| ApiError::NotFound(format!("Connection not found: {raw}")))?;

    if let Err(e) = state.connections.resolve(&connection_id) {
        warn!("Rejected submission: {}", e);
        return Err(e.into());
    }

    let request: JsonRpcRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON-RPC message: {e}")))?;

    debug!(
        "Accepted {} for connection {} (id {:?})",
        request.method, connection_id, request.id
    );

    tokio::spawn(deliver(
        state.mcp.clone(),
        state.connections.clone(),
        connection_id,
        request,
    ));

    Ok((StatusCode::ACCEPTED, Json(json!({ "received": true }))))
}

/// Run a request and push its response onto the originating connection
async fn deliver(
    mcp: McpServer,
    connections: ConnectionRegistry,
    connection_id: ConnectionId,
    request: JsonRpcRequest,
) {
    let method = request.method.clone();
    let Some(response) = mcp.handle_request(request).await else {
        return;
    };

    match connections.publish(&connection_id, &response).await {
        Ok(()) => {}
        Err(TransportError::Serialization(e)) => {
            warn!("Could not encode response to {}: {}", method, e);
        }
        Err(e) => {
            warn!("Dropping undeliverable response to {}: {}", method, e);
        }
    }
}
