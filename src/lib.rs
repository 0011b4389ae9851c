/// Public library interface for the document gateway MCP server
///
/// This module exports the main server implementation and public types
/// that can be used by other applications or tests.

use std::sync::Arc;

use thiserror::Error;

// Internal modules
pub mod completion;
pub mod config;
mod domain;
pub mod extract;
pub mod http;
pub mod mcp;
mod storage;
pub mod tools;

// Re-export public modules and types
pub use completion::{CompletionClient, CompletionError, DisabledCompletion, HttpCompletionClient, QueryMode};
pub use config::{CompletionConfig, ServerConfig};
pub use domain::*;
pub use http::AppState;
pub use mcp::{ConnectionRegistry, McpServer};
pub use storage::{DocumentStorage, InMemoryStorage, SearchHit, SessionSummary, StorageError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Completion client error: {0}")]
    Completion(#[from] CompletionError),
}

/// Document gateway server that implements the MCP protocol over SSE
///
/// The server owns the document store and the connection registry; both
/// live for exactly as long as it does.
pub struct DocumentGatewayServer {
    config: ServerConfig,
    storage: Arc<InMemoryStorage>,
    connections: ConnectionRegistry,
    state: AppState,
}

impl DocumentGatewayServer {
    /// Create a server, connecting the query facade to the configured
    /// completion endpoint when there is one
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let completion: Arc<dyn CompletionClient> = match &config.completion {
            Some(settings) => Arc::new(HttpCompletionClient::new(settings)?),
            None => {
                tracing::warn!("No completion endpoint configured, document queries will fail");
                Arc::new(DisabledCompletion)
            }
        };

        Ok(Self::with_completion(config, completion))
    }

    /// Create a server around an explicit completion client
    pub fn with_completion(config: ServerConfig, completion: Arc<dyn CompletionClient>) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        let connections = ConnectionRegistry::new();
        let state = AppState::new(
            storage.clone(),
            connections.clone(),
            completion,
            &config.message_path,
        );

        Self {
            config,
            storage,
            connections,
            state,
        }
    }

    /// The full HTTP application
    pub fn router(&self) -> axum::Router {
        http::router(self.state.clone())
    }

    /// Serve until Ctrl-C
    ///
    /// This method will block until the server is shut down or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_address).await?;
        tracing::info!("MCP server listening on {}", listener.local_addr()?);

        let connections = self.connections.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                }
                tracing::info!("Shutdown requested");
                // Open SSE streams would otherwise keep the server alive
                connections.shutdown();
            })
            .await?;

        self.shutdown();
        Ok(())
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &InMemoryStorage {
        &self.storage
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Close every connection and drop every session
    pub fn shutdown(&self) {
        self.connections.shutdown();
        self.storage.clear();
    }
}
