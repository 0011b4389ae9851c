/// Tool for listing the documents of a session
///
/// This module implements the list_documents MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{DocumentSummary, SessionId};
use crate::storage::{DocumentStorage, StorageError};

/// Parameters for listing documents
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsParams {
    /// The session ID to list documents from
    pub session_id: String,
}

/// Response from listing documents
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    pub session_id: SessionId,
    pub document_count: usize,
    pub documents: Vec<DocumentSummary>,
}

/// List documents using the provided storage
pub fn list_documents<S: DocumentStorage + ?Sized>(
    storage: &S,
    params: ListDocumentsParams,
) -> Result<ListDocumentsResponse, StorageError> {
    let session_id = SessionId::from_string(&params.session_id)
        .map_err(|_| StorageError::session_not_found(&params.session_id))?;

    let documents = storage.list_documents(&session_id)?;

    Ok(ListDocumentsResponse {
        session_id,
        document_count: documents.len(),
        documents,
    })
}
