/// MCP server implementation that handles JSON-RPC methods
///
/// This module implements the method set of the protocol:
/// 1. Capability negotiation (`initialize`, `ping`)
/// 2. Tool listing and invocation through the tool dispatcher
/// 3. Resource listing and reading over document sessions
///
/// Delivery is not its concern: it turns a request into at most one response
/// and the transport decides where that response goes.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::domain::{parse_session_uri, session_uri};
use crate::mcp::protocol::*;
use crate::storage::DocumentStorage;
use crate::tools::{Tool, ToolDispatcher};

/// Name this server reports during initialization
pub const SERVER_NAME: &str = "document-gateway-mcp";

/// MIME type of every resource this server exposes
const RESOURCE_MIME_TYPE: &str = "application/json";

/// MCP server that answers JSON-RPC requests from agents
#[derive(Clone)]
pub struct McpServer {
    storage: Arc<dyn DocumentStorage>,
    tools: ToolDispatcher,
}

impl McpServer {
    /// Create a new MCP server over the given document store
    pub fn new(storage: Arc<dyn DocumentStorage>) -> Self {
        Self {
            tools: ToolDispatcher::new(storage.clone()),
            storage,
        }
    }

    /// Handle a JSON-RPC request
    ///
    /// Returns `None` for notifications, which are never answered.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling MCP method: {}", request.method);

        let outcome = if request.jsonrpc != JSONRPC_VERSION {
            Err(McpError::InvalidRequest(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            )))
        } else {
            self.dispatch(&request).await
        };

        let Some(id) = request.id else {
            if let Err(e) = outcome {
                warn!("Notification {} failed: {}", request.method, e);
            }
            return None;
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!("MCP method {} failed: {}", request.method, e);
                JsonRpcResponse::from_mcp_error(id, &e)
            }
        })
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> Result<Value, McpError> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(params(request)?),
            "resources/list" => self.handle_resources_list(),
            "resources/read" => self.handle_resources_read(params(request)?),
            method if method.starts_with("notifications/") => Ok(Value::Null),
            method => Err(McpError::MethodNotFound(method.to_string())),
        }
    }

    /// Handle MCP initialization request
    fn handle_initialize(&self) -> Result<Value, McpError> {
        info!("MCP client initialized");

        to_value(InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
                resources: Some(ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }

    /// Handle tools/list request
    fn handle_tools_list(&self) -> Result<Value, McpError> {
        Ok(json!({ "tools": self.tools.definitions() }))
    }

    /// Handle tools/call request
    fn handle_tools_call(&self, params: ToolCallParams) -> Result<Value, McpError> {
        let tool = Tool::from_name(&params.name).ok_or(McpError::UnknownTool(params.name))?;
        to_value(self.tools.call(tool, params.arguments))
    }

    /// Handle resources/list request: one resource per document session
    fn handle_resources_list(&self) -> Result<Value, McpError> {
        let resources: Vec<ResourceDescriptor> = self
            .storage
            .list_sessions()
            .into_iter()
            .map(|session| ResourceDescriptor {
                uri: session_uri(&session.session_id),
                name: format!("Session {}", session.session_id),
                description: format!("Session with {} document(s)", session.document_count),
                mime_type: RESOURCE_MIME_TYPE.to_string(),
            })
            .collect();

        Ok(json!({ "resources": resources }))
    }

    /// Handle resources/read request
    fn handle_resources_read(&self, params: ReadResourceParams) -> Result<Value, McpError> {
        let session_id = parse_session_uri(&params.uri)
            .map_err(|_| McpError::ResourceNotFound(params.uri.clone()))?;

        let summary = self
            .storage
            .session_summary(&session_id)
            .map_err(|e| McpError::ResourceNotFound(e.to_string()))?;

        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| McpError::Internal(e.to_string()))?;

        Ok(json!({
            "contents": [ResourceContents {
                uri: params.uri,
                mime_type: RESOURCE_MIME_TYPE.to_string(),
                text,
            }]
        }))
    }
}

/// Decode a request's params into the shape a method expects
fn params<T: DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, McpError> {
    let raw = request
        .params
        .clone()
        .ok_or_else(|| McpError::InvalidParams("Missing parameters".to_string()))?;

    serde_json::from_value(raw).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::Internal(e.to_string()))
}
