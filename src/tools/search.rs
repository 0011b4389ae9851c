/// Tool for searching documents
///
/// This module implements the search_documents MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::SessionId;
use crate::storage::{DocumentStorage, SearchHit, StorageError};

/// Parameters for searching documents
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocumentsParams {
    /// The text to search for in documents
    pub query: String,
    /// Optional: limit search to a specific session (empty searches all)
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response from a search
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocumentsResponse {
    pub query: String,
    pub result_count: usize,
    pub results: Vec<SearchHit>,
}

/// Search documents using the provided storage
pub fn search_documents<S: DocumentStorage + ?Sized>(
    storage: &S,
    params: SearchDocumentsParams,
) -> Result<SearchDocumentsResponse, StorageError> {
    let scope = params
        .session_id
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(|raw| SessionId::from_string(raw).map_err(|_| StorageError::session_not_found(raw)))
        .transpose()?;

    let results = storage.search_documents(&params.query, scope.as_ref())?;

    Ok(SearchDocumentsResponse {
        query: params.query,
        result_count: results.len(),
        results,
    })
}
