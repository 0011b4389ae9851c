/// Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Default completion budget per answer
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Path clients open to receive the event stream
pub const SSE_PATH: &str = "/mcp/sse";

/// Path clients POST JSON-RPC submissions to
pub const MESSAGE_PATH: &str = "/mcp/message";

/// Settings for the upstream completion endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Full URL of the chat-completions endpoint
    pub endpoint: String,
    /// Value sent in the `api-key` header
    pub api_key: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Top-level server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    /// Submission address announced in each connection's `endpoint` event
    pub message_path: String,
    /// `None` disables the query facade's upstream call
    pub completion: Option<CompletionConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            message_path: MESSAGE_PATH.to_string(),
            completion: None,
        }
    }
}
