/// Main entry point for the document gateway MCP server
///
/// This file sets up logging, parses command line arguments, and starts the
/// HTTP server carrying the MCP transport and the REST facades.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use document_gateway_mcp::config::{DEFAULT_MAX_TOKENS, DEFAULT_PORT, MESSAGE_PATH};
use document_gateway_mcp::{CompletionConfig, DocumentGatewayServer, ServerConfig};

/// Command line arguments for the document gateway MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Chat-completions endpoint used by the query facade
    #[arg(long, env = "FOUNDRY_ENDPOINT")]
    completion_endpoint: Option<String>,

    /// API key sent to the completion endpoint
    #[arg(long, env = "FOUNDRY_API_KEY", hide_env_values = true)]
    completion_api_key: Option<String>,

    /// Token budget per answer
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 120)]
    completion_timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    // RUST_LOG takes precedence over the flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("document_gateway_mcp={log_level},tower_http={log_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting document gateway MCP server");

    let completion = args.completion_endpoint.map(|endpoint| CompletionConfig {
        endpoint,
        api_key: args.completion_api_key.unwrap_or_default(),
        max_tokens: args.max_tokens,
        timeout: Duration::from_secs(args.completion_timeout),
    });

    let config = ServerConfig {
        bind_address: SocketAddr::new(args.host, args.port),
        message_path: MESSAGE_PATH.to_string(),
        completion,
    };

    let server = DocumentGatewayServer::new(config)?;
    server.run().await?;

    info!("Document gateway MCP server shutdown complete");
    Ok(())
}
