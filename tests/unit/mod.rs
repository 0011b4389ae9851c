/// Unit tests for the public library API
use std::sync::Arc;

use document_gateway_mcp::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use document_gateway_mcp::tools::{Tool, ToolDispatcher};
use document_gateway_mcp::*;
use serde_json::{json, Map, Value};

fn orders_store() -> (Arc<InMemoryStorage>, SessionId, DocumentId) {
    let storage = Arc::new(InMemoryStorage::new());
    let session = storage.create_session();
    let doc = storage
        .upload_document(
            &session,
            "orders.csv".to_string(),
            "OrderID,Customer,Amount\nORD001,Alice,10.50\nORD002,Bob,7.25\nORD003,Alice,3.00"
                .to_string(),
        )
        .unwrap();
    (storage, session, doc)
}

fn arguments(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Pretty JSON carried in the first content block of a tool result
fn tool_payload(dispatcher: &ToolDispatcher, tool: Tool, args: Value) -> Value {
    let result = dispatcher.call(tool, arguments(args));
    assert!(!result.is_error, "tool failed: {:?}", result.content);
    serde_json::from_str(&result.content[0].text).unwrap()
}

async fn call(server: &McpServer, request: Value) -> JsonRpcResponse {
    let request: JsonRpcRequest = serde_json::from_value(request).unwrap();
    server.handle_request(request).await.expect("request had an id")
}

#[test]
fn test_upload_then_get_round_trip() {
    let storage = Arc::new(InMemoryStorage::new());
    let session = storage.create_session();
    let dispatcher = ToolDispatcher::new(storage.clone());

    let uploaded = tool_payload(
        &dispatcher,
        Tool::UploadDocument,
        json!({"sessionId": session.to_string(), "title": "Memo", "text": "Ship on Friday."}),
    );
    assert_eq!(uploaded["success"], true);

    let fetched = tool_payload(
        &dispatcher,
        Tool::GetDocument,
        json!({"sessionId": session.to_string(), "docId": uploaded["docId"]}),
    );
    assert_eq!(fetched["title"], "Memo");
    assert_eq!(fetched["text"], "Ship on Friday.");
}

#[test]
fn test_listing_never_exposes_text() {
    let (storage, session, _) = orders_store();
    let dispatcher = ToolDispatcher::new(storage);

    let listed = tool_payload(
        &dispatcher,
        Tool::ListDocuments,
        json!({"sessionId": session.to_string()}),
    );
    assert_eq!(listed["documentCount"], 1);
    let entry = &listed["documents"][0];
    assert!(entry.get("text").is_none());
    assert!(entry["textLength"].as_u64().unwrap() > 0);
}

#[test]
fn test_search_returns_one_hit_per_document() {
    let (storage, session, doc) = orders_store();
    let dispatcher = ToolDispatcher::new(storage);

    let found = tool_payload(
        &dispatcher,
        Tool::SearchDocuments,
        json!({"query": "alice", "sessionId": session.to_string()}),
    );
    assert_eq!(found["resultCount"], 1);
    assert_eq!(found["results"][0]["docId"], doc.to_string());
    assert!(found["results"][0]["snippet"]
        .as_str()
        .unwrap()
        .contains("Alice"));
}

#[test]
fn test_missing_argument_is_a_tool_error() {
    let (storage, _, _) = orders_store();
    let dispatcher = ToolDispatcher::new(storage);

    let result = dispatcher.call(Tool::GetDocument, Map::new());
    assert!(result.is_error);
    assert!(result.content[0].text.starts_with("Error: "));
}

#[tokio::test]
async fn test_tools_list_advertises_four_tools() {
    let (storage, _, _) = orders_store();
    let server = McpServer::new(storage);

    let response = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).await;
    let result = response.result.unwrap();
    let names: Vec<&str> = result["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["list_documents", "get_document", "search_documents", "upload_document"]
    );
}

#[tokio::test]
async fn test_unknown_tool_is_invalid_params() {
    let (storage, _, _) = orders_store();
    let server = McpServer::new(storage);

    let response = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "delete_everything"}}),
    )
    .await;
    assert_eq!(response.error.unwrap().code, -32602);
}

#[tokio::test]
async fn test_read_session_resource_with_two_documents() {
    let (storage, session, _) = orders_store();
    storage
        .upload_document(&session, "second".to_string(), "more text".to_string())
        .unwrap();
    let server = McpServer::new(storage);

    let uri = format!("session://{session}");
    let listed = call(&server, json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"})).await;
    assert_eq!(listed.result.unwrap()["resources"][0]["uri"], uri.as_str());

    let read = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 4, "method": "resources/read", "params": {"uri": uri}}),
    )
    .await;
    let result = read.result.unwrap();
    let text = result["contents"][0]["text"].as_str().unwrap();
    let summary: Value = serde_json::from_str(text).unwrap();
    assert_eq!(summary["documentCount"], 2);
    assert_eq!(summary["documents"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_read_unknown_resource_is_not_found() {
    let (storage, _, _) = orders_store();
    let server = McpServer::new(storage);

    let response = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 5, "method": "resources/read", "params": {"uri": "file:///etc/passwd"}}),
    )
    .await;
    assert_eq!(response.error.unwrap().code, -32002);
}

#[test]
fn test_server_lifecycle() {
    let server = DocumentGatewayServer::with_completion(ServerConfig::default(), Arc::new(DisabledCompletion));
    server.storage().create_session();
    assert_eq!(server.storage().session_count(), 1);

    server.shutdown();
    assert_eq!(server.storage().session_count(), 0);
    assert_eq!(server.connections().connection_count(), 0);
}
