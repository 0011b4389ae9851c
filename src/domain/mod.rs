/// Domain module containing the core entities and their rules
///
/// This module defines documents, document sessions, the identifier types
/// that address them, and the `session://` resource URI scheme.

pub mod document;
pub mod types;

// Re-export public types for easy access
pub use document::*;
pub use types::*;

use thiserror::Error;

/// Scheme prefix for session resources
pub const SESSION_URI_SCHEME: &str = "session://";

/// Errors that can occur during domain operations
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Unknown resource URI: {0}")]
    UnknownResourceUri(String),

    #[error("Invalid session id in resource URI: {0}")]
    InvalidSessionUri(String),
}

/// Resource URI addressing a document session
pub fn session_uri(session_id: &SessionId) -> String {
    format!("{SESSION_URI_SCHEME}{session_id}")
}

/// Parse a `session://<id>` URI back into the session it addresses
pub fn parse_session_uri(uri: &str) -> Result<SessionId, DomainError> {
    let raw = uri
        .strip_prefix(SESSION_URI_SCHEME)
        .ok_or_else(|| DomainError::UnknownResourceUri(uri.to_string()))?;

    SessionId::from_string(raw).map_err(|_| DomainError::InvalidSessionUri(uri.to_string()))
}
