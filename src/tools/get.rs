/// Tool for fetching a single document
///
/// This module implements the get_document MCP tool. It is the only tool
/// that returns full document text.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{DocumentId, SessionId};
use crate::storage::{DocumentStorage, StorageError};

/// Parameters for fetching a document
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentParams {
    /// The session ID containing the document
    pub session_id: String,
    /// The document ID to retrieve
    pub doc_id: String,
}

/// Response carrying the full document
#[derive(Debug, Serialize)]
pub struct GetDocumentResponse {
    pub id: DocumentId,
    pub title: String,
    pub text: String,
}

/// Fetch a document using the provided storage
pub fn get_document<S: DocumentStorage + ?Sized>(
    storage: &S,
    params: GetDocumentParams,
) -> Result<GetDocumentResponse, StorageError> {
    let session_id = SessionId::from_string(&params.session_id)
        .map_err(|_| StorageError::session_not_found(&params.session_id))?;

    // Session existence is checked before the document id is even parsed
    if !storage.has_session(&session_id) {
        return Err(StorageError::session_not_found(session_id));
    }

    let doc_id = DocumentId::from_string(&params.doc_id)
        .map_err(|_| StorageError::document_not_found(&params.doc_id))?;

    let document = storage.get_document(&session_id, &doc_id)?;

    Ok(GetDocumentResponse {
        id: document.id,
        title: document.title,
        text: document.text,
    })
}
