/// Tool for uploading a document
///
/// This module implements the upload_document MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{DocumentId, SessionId};
use crate::storage::{DocumentStorage, StorageError};

/// Parameters for uploading a document
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentParams {
    /// The session ID to upload the document to
    pub session_id: String,
    /// The title/name of the document
    pub title: String,
    /// The full text content of the document
    pub text: String,
}

/// Response from uploading a document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentResponse {
    pub success: bool,
    pub doc_id: DocumentId,
    pub title: String,
    pub session_id: SessionId,
}

/// Upload a document using the provided storage
pub fn upload_document<S: DocumentStorage + ?Sized>(
    storage: &S,
    params: UploadDocumentParams,
) -> Result<UploadDocumentResponse, StorageError> {
    let session_id = SessionId::from_string(&params.session_id)
        .map_err(|_| StorageError::session_not_found(&params.session_id))?;

    let doc_id = storage.upload_document(&session_id, params.title.clone(), params.text)?;

    Ok(UploadDocumentResponse {
        success: true,
        doc_id,
        title: params.title,
        session_id,
    })
}
