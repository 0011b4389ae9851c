/// MCP over SSE: connection handshake, submission and correlated delivery
use std::collections::HashSet;
use std::time::Duration;

use axum::body::{Body, BodyDataStream};
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

/// Reads `event:`/`data:` frames off an SSE response body
struct EventReader {
    stream: BodyDataStream,
    buffer: String,
}

impl EventReader {
    async fn open(app: &Router) -> Self {
        let response = app
            .clone()
            .oneshot(Request::get("/mcp/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/event-stream"));

        Self {
            stream: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    async fn next_event(&mut self) -> (String, String) {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                let mut event = None;
                let mut data = None;
                for line in frame.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        event = Some(v.trim_start().to_string());
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data = Some(v.trim_start().to_string());
                    }
                }
                // Keep-alive comments carry neither field
                if let (Some(event), Some(data)) = (event, data) {
                    return (event, data);
                }
                continue;
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.stream.next())
                .await
                .expect("timed out waiting for an event")
                .expect("event stream ended")
                .expect("event stream failed");
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }

    /// The announced submission path
    async fn endpoint(&mut self) -> String {
        let (event, data) = self.next_event().await;
        assert_eq!(event, "endpoint");
        data
    }

    async fn next_message(&mut self) -> Value {
        let (event, data) = self.next_event().await;
        assert_eq!(event, "message");
        serde_json::from_str(&data).unwrap()
    }
}

async fn submit(app: &Router, path: &str, message: Value) -> StatusCode {
    app.clone()
        .oneshot(json_request("POST", path, message))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_endpoint_event_comes_first() {
    let server = test_server();
    let app = server.router();

    let mut reader = EventReader::open(&app).await;
    let endpoint = reader.endpoint().await;

    assert!(endpoint.starts_with("/mcp/message?sessionId="));
    assert_eq!(server.connections().connection_count(), 1);
}

#[tokio::test]
async fn test_submission_is_acknowledged_and_answered_on_stream() {
    let server = test_server();
    let app = server.router();
    let mut reader = EventReader::open(&app).await;
    let endpoint = reader.endpoint().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &endpoint,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await, json!({"received": true}));

    let message = reader.next_message().await;
    assert_eq!(message["id"], 1);
    assert_eq!(message["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(message["result"]["serverInfo"]["name"], "document-gateway-mcp");
}

#[tokio::test]
async fn test_notifications_are_never_answered() {
    let server = test_server();
    let app = server.router();
    let mut reader = EventReader::open(&app).await;
    let endpoint = reader.endpoint().await;

    let status = submit(
        &app,
        &endpoint,
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    submit(&app, &endpoint, json!({"jsonrpc": "2.0", "id": 2, "method": "ping"})).await;

    let message = reader.next_message().await;
    assert_eq!(message["id"], 2);
    assert_eq!(message["result"], json!({}));
}

#[tokio::test]
async fn test_concurrent_calls_are_correlated_by_id() {
    let server = test_server();
    let session = server.storage().create_session();
    server
        .storage()
        .upload_document(&session, "orders.csv".into(), "ORD001,Alice,10.50".into())
        .unwrap();

    let app = server.router();
    let mut reader = EventReader::open(&app).await;
    let endpoint = reader.endpoint().await;

    let list = json!({
        "jsonrpc": "2.0", "id": 10, "method": "tools/call",
        "params": {"name": "list_documents", "arguments": {"sessionId": session.to_string()}}
    });
    let search = json!({
        "jsonrpc": "2.0", "id": 11, "method": "tools/call",
        "params": {"name": "search_documents", "arguments": {"query": "alice"}}
    });
    let (a, b) = tokio::join!(submit(&app, &endpoint, list), submit(&app, &endpoint, search));
    assert_eq!((a, b), (StatusCode::ACCEPTED, StatusCode::ACCEPTED));

    let mut seen = HashSet::new();
    for _ in 0..2 {
        let message = reader.next_message().await;
        let text = message["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();

        match message["id"].as_i64().unwrap() {
            10 => assert_eq!(payload["documentCount"], 1),
            11 => assert_eq!(payload["resultCount"], 1),
            other => panic!("unexpected response id {other}"),
        }
        seen.insert(message["id"].as_i64().unwrap());
    }
    assert_eq!(seen, HashSet::from([10, 11]));
}

#[tokio::test]
async fn test_responses_stay_on_their_connection() {
    let server = test_server();
    let app = server.router();
    let mut first = EventReader::open(&app).await;
    let mut second = EventReader::open(&app).await;
    let first_endpoint = first.endpoint().await;
    let second_endpoint = second.endpoint().await;
    assert_ne!(first_endpoint, second_endpoint);

    submit(&app, &second_endpoint, json!({"jsonrpc": "2.0", "id": "b", "method": "ping"})).await;
    submit(&app, &first_endpoint, json!({"jsonrpc": "2.0", "id": "a", "method": "ping"})).await;

    assert_eq!(first.next_message().await["id"], "a");
    assert_eq!(second.next_message().await["id"], "b");
}

#[tokio::test]
async fn test_unknown_method_is_reported_on_stream() {
    let server = test_server();
    let app = server.router();
    let mut reader = EventReader::open(&app).await;
    let endpoint = reader.endpoint().await;

    submit(&app, &endpoint, json!({"jsonrpc": "2.0", "id": 3, "method": "prompts/list"})).await;

    let message = reader.next_message().await;
    assert_eq!(message["id"], 3);
    assert_eq!(message["error"]["code"], -32601);
}

#[tokio::test]
async fn test_unknown_connection_is_rejected() {
    let server = test_server();
    let app = server.router();

    let path = format!("/mcp/message?sessionId={}", ConnectionId::new());
    let status = submit(&app, &path, json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = submit(&app, "/mcp/message?sessionId=garbage", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_connection_parameter_is_bad_request() {
    let server = test_server();
    let app = server.router();

    let status = submit(&app, "/mcp/message", json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_submission_is_bad_request() {
    let server = test_server();
    let app = server.router();
    let mut reader = EventReader::open(&app).await;
    let endpoint = reader.endpoint().await;

    let response = app
        .clone()
        .oneshot(
            Request::post(endpoint.as_str())
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_closed_connection_stops_accepting_submissions() {
    let server = test_server();
    let app = server.router();

    let mut reader = EventReader::open(&app).await;
    let endpoint = reader.endpoint().await;
    drop(reader);

    assert_eq!(server.connections().connection_count(), 0);
    let status = submit(&app, &endpoint, json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
