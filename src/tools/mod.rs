/// MCP tools for document management
///
/// This module contains the tools that external clients (AI agents) can call
/// to interact with the document store, plus the dispatcher that maps a tool
/// name and its arguments onto a storage operation.

pub mod get;
pub mod list;
pub mod search;
pub mod upload;

// Re-export tool functions for easy access
pub use get::*;
pub use list::*;
pub use search::*;
pub use upload::*;

use std::fmt;
use std::sync::Arc;

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::mcp::protocol::{ToolCallResult, ToolDefinition};
use crate::storage::{DocumentStorage, StorageError};

/// Errors raised while running a tool
///
/// These never leave the dispatcher as faults; they are rendered into an
/// `isError` tool result.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Missing required argument '{argument}' for tool {tool}")]
    MissingArgument { tool: Tool, argument: String },

    #[error("Invalid arguments for tool {tool}: {source}")]
    InvalidArguments {
        tool: Tool,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to render tool result: {0}")]
    Render(#[source] serde_json::Error),
}

/// The fixed set of tools this server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    ListDocuments,
    GetDocument,
    SearchDocuments,
    UploadDocument,
}

impl Tool {
    /// Every tool, in the order they are advertised
    pub const ALL: [Tool; 4] = [
        Tool::ListDocuments,
        Tool::GetDocument,
        Tool::SearchDocuments,
        Tool::UploadDocument,
    ];

    /// Wire name of the tool
    pub fn name(self) -> &'static str {
        match self {
            Tool::ListDocuments => "list_documents",
            Tool::GetDocument => "get_document",
            Tool::SearchDocuments => "search_documents",
            Tool::UploadDocument => "upload_document",
        }
    }

    /// Resolve a wire name against the enumerated set
    pub fn from_name(name: &str) -> Option<Tool> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::ListDocuments => "List all documents in a session with their IDs and titles",
            Tool::GetDocument => "Retrieve the full content of a specific document by ID",
            Tool::SearchDocuments => {
                "Search for documents containing specific text across all sessions or a specific session"
            }
            Tool::UploadDocument => "Upload a new document to a session",
        }
    }

    /// JSON schema of the tool's arguments
    pub fn input_schema(self) -> Value {
        match self {
            Tool::ListDocuments => schema_of::<ListDocumentsParams>(),
            Tool::GetDocument => schema_of::<GetDocumentParams>(),
            Tool::SearchDocuments => schema_of::<SearchDocumentsParams>(),
            Tool::UploadDocument => schema_of::<UploadDocumentParams>(),
        }
    }

    /// Names of the arguments the caller must supply
    pub fn required_arguments(self) -> Vec<String> {
        self.input_schema()
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flat object schema for a params struct, without the root metadata
fn schema_of<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|settings| {
            settings.option_add_null_type = false;
            settings.inline_subschemas = true;
            settings.meta_schema = None;
        })
        .into_generator();

    let mut schema = serde_json::to_value(generator.into_root_schema_for::<T>()).unwrap_or_default();
    if let Value::Object(root) = &mut schema {
        root.remove("title");
        root.remove("description");
    }
    schema
}

/// Routes tool invocations to the document store
#[derive(Clone)]
pub struct ToolDispatcher {
    storage: Arc<dyn DocumentStorage>,
}

impl ToolDispatcher {
    pub fn new(storage: Arc<dyn DocumentStorage>) -> Self {
        Self { storage }
    }

    /// Descriptors for every registered tool
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        Tool::ALL.into_iter().map(Tool::definition).collect()
    }

    /// Run a tool; failures come back as an error result, never a fault
    pub fn call(&self, tool: Tool, arguments: Map<String, Value>) -> ToolCallResult {
        info!("MCP tool called: {}", tool);

        match self.try_call(tool, arguments) {
            Ok(text) => ToolCallResult::success(text),
            Err(e) => {
                warn!("Error executing MCP tool {}: {}", tool, e);
                ToolCallResult::error(e.to_string())
            }
        }
    }

    fn try_call(&self, tool: Tool, arguments: Map<String, Value>) -> Result<String, ToolError> {
        check_required(tool, &arguments)?;
        let arguments = Value::Object(arguments);
        let storage = self.storage.as_ref();

        match tool {
            Tool::ListDocuments => render(&list_documents(storage, parse(tool, arguments)?)?),
            Tool::GetDocument => render(&get_document(storage, parse(tool, arguments)?)?),
            Tool::SearchDocuments => render(&search_documents(storage, parse(tool, arguments)?)?),
            Tool::UploadDocument => render(&upload_document(storage, parse(tool, arguments)?)?),
        }
    }
}

fn check_required(tool: Tool, arguments: &Map<String, Value>) -> Result<(), ToolError> {
    let missing = tool
        .required_arguments()
        .into_iter()
        .find(|name| arguments.get(name).map_or(true, Value::is_null));

    match missing {
        Some(argument) => Err(ToolError::MissingArgument { tool, argument }),
        None => Ok(()),
    }
}

fn parse<T: DeserializeOwned>(tool: Tool, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|source| ToolError::InvalidArguments { tool, source })
}

fn render<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value).map_err(ToolError::Render)
}
