/// HTTP error mapping for the plain REST facades
///
/// Not-found cases answer with a plain-text 404, malformed input with a
/// JSON 400, and extraction or upstream failures with a JSON 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::completion::CompletionError;
use crate::extract::ExtractError;
use crate::mcp::TransportError;
use crate::storage::StorageError;

/// Errors returned by HTTP handlers
#[derive(Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::NotFound(message) => (status, message).into_response(),
            ApiError::BadRequest(message) | ApiError::Internal(message) => {
                (status, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::SessionNotFound { .. } => ApiError::NotFound("Session not found".to_string()),
            StorageError::DocumentNotFound { .. } => {
                ApiError::NotFound("Document not found".to_string())
            }
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFormat(_) => {
                ApiError::BadRequest("Unsupported file type.".to_string())
            }
            ExtractError::ExtractionFailed(reason) => {
                ApiError::Internal(format!("Failed to parse file: {reason}"))
            }
        }
    }
}

impl From<CompletionError> for ApiError {
    fn from(e: CompletionError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::ConnectionNotFound(_) | TransportError::ConnectionClosed(_) => {
                ApiError::NotFound(e.to_string())
            }
            TransportError::Serialization(_) => ApiError::Internal(e.to_string()),
        }
    }
}
