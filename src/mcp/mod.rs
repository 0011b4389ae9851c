/// MCP protocol implementation
///
/// This module handles the Model Context Protocol communication, including
/// JSON-RPC parsing, method routing, and the SSE connection registry.

pub mod protocol;
pub mod server;
pub mod transport;

// Re-export main types
pub use server::McpServer;
pub use transport::{ConnectionRegistry, ConnectionState, ConnectionStream, OutboundEvent, TransportError};
