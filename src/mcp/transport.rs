/// SSE transport for the MCP server.
///
/// A client opens one long-lived event stream and receives every JSON-RPC
/// response on it. Requests arrive separately as short HTTP POSTs that name
/// the connection they act for. The registry is the correlation table
/// between the two:
///
/// - `open` mints a connection id, queues the `endpoint` control event as the
///   first frame, and hands back the stream to serve.
/// - `publish` resolves a connection id and writes one response frame.
/// - dropping the stream (client went away) removes the entry; publishing to
///   a removed or unknown id fails instead of buffering.
///
/// Each connection is backed by a single channel whose receiver is the only
/// writer of the HTTP response body, so concurrent responses are serialised
/// frame by frame and never interleave.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::domain::ConnectionId;
use crate::mcp::protocol::JsonRpcResponse;

/// Frames that may be waiting on a single connection
pub const CONNECTION_BUFFER: usize = 32;

/// Query parameter carrying the connection id on the submission address
pub const CONNECTION_QUERY_PARAM: &str = "sessionId";

/// Errors raised when a response cannot be delivered
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    #[error("Connection closed: {0}")]
    ConnectionClosed(ConnectionId),

    #[error("Failed to encode message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Lifecycle of a connection; `Closed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// A frame queued for an SSE stream
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Announces where submissions for this connection must be sent
    Endpoint(String),
    /// A serialized JSON-RPC message
    Message(String),
}

impl OutboundEvent {
    /// SSE `event:` field
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundEvent::Endpoint(_) => "endpoint",
            OutboundEvent::Message(_) => "message",
        }
    }

    /// SSE `data:` field
    pub fn data(&self) -> &str {
        match self {
            OutboundEvent::Endpoint(data) | OutboundEvent::Message(data) => data,
        }
    }
}

type ConnectionMap = HashMap<ConnectionId, mpsc::Sender<OutboundEvent>>;

/// Registry of open SSE connections
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<ConnectionMap>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new connection whose submission address is under `message_path`
    pub fn open(&self, message_path: &str) -> ConnectionStream {
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);

        let id = {
            let mut connections = self.connections.write();
            let mut id = ConnectionId::new();
            while connections.contains_key(&id) {
                id = ConnectionId::new();
            }

            let endpoint = format!("{message_path}?{CONNECTION_QUERY_PARAM}={id}");
            if let Err(e) = tx.try_send(OutboundEvent::Endpoint(endpoint)) {
                warn!("Failed to queue endpoint event for {}: {}", id, e);
            }
            connections.insert(id, tx);
            id
        };

        info!("SSE connection opened: {}", id);

        ConnectionStream {
            id,
            inner: ReceiverStream::new(rx),
            registry: Arc::downgrade(&self.connections),
        }
    }

    pub fn state(&self, id: &ConnectionId) -> ConnectionState {
        match self.connections.read().get(id) {
            Some(tx) if !tx.is_closed() => ConnectionState::Open,
            _ => ConnectionState::Closed,
        }
    }

    /// Check that a connection can still take responses
    pub fn resolve(&self, id: &ConnectionId) -> Result<(), TransportError> {
        self.sender(id).map(|_| ())
    }

    /// Deliver one JSON-RPC response on a connection
    pub async fn publish(
        &self,
        id: &ConnectionId,
        response: &JsonRpcResponse,
    ) -> Result<(), TransportError> {
        let payload = serde_json::to_string(response)?;
        let sender = self.sender(id)?;

        sender
            .send(OutboundEvent::Message(payload))
            .await
            .map_err(|_| {
                self.close(id);
                TransportError::ConnectionClosed(*id)
            })?;

        debug!("Published response {} on connection {}", response.id, id);
        Ok(())
    }

    /// Forget a connection; returns whether it was registered
    pub fn close(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.write().remove(id).is_some();
        if removed {
            info!("SSE connection closed: {}", id);
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Close every connection; their streams end once drained
    pub fn shutdown(&self) {
        let closed = self.connections.write().drain().count();
        info!("Transport registry shut down, {} connection(s) closed", closed);
    }

    fn sender(&self, id: &ConnectionId) -> Result<mpsc::Sender<OutboundEvent>, TransportError> {
        let sender = self
            .connections
            .read()
            .get(id)
            .cloned()
            .ok_or(TransportError::ConnectionNotFound(*id))?;

        if sender.is_closed() {
            self.close(id);
            return Err(TransportError::ConnectionClosed(*id));
        }
        Ok(sender)
    }
}

/// Outbound event stream of one connection
///
/// Dropping it unregisters the connection.
#[derive(Debug)]
pub struct ConnectionStream {
    id: ConnectionId,
    inner: ReceiverStream<OutboundEvent>,
    registry: Weak<RwLock<ConnectionMap>>,
}

impl ConnectionStream {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Stream for ConnectionStream {
    type Item = OutboundEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for ConnectionStream {
    fn drop(&mut self) {
        if let Some(connections) = self.registry.upgrade() {
            if connections.write().remove(&self.id).is_some() {
                info!("SSE connection closed: {}", self.id);
            }
        }
    }
}
