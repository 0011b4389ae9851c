/// Storage layer for document sessions
///
/// This module owns every document session and the documents uploaded into
/// them. State lives for the lifetime of the process only.

pub mod memory;

// Re-export the main storage types
pub use memory::*;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Document, DocumentId, DocumentSummary, HistoryEntry, SessionId};

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Document not found: {doc_id}")]
    DocumentNotFound { doc_id: String },
}

impl StorageError {
    pub fn session_not_found(session_id: impl ToString) -> Self {
        Self::SessionNotFound {
            session_id: session_id.to_string(),
        }
    }

    pub fn document_not_found(doc_id: impl ToString) -> Self {
        Self::DocumentNotFound {
            doc_id: doc_id.to_string(),
        }
    }
}

/// A document that matched a search query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub session_id: SessionId,
    pub doc_id: DocumentId,
    pub title: String,
    pub snippet: String,
}

/// Bounded description of a session: sizes, never raw text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub document_count: usize,
    pub documents: Vec<DocumentSummary>,
}

/// Trait defining the storage interface for document sessions
///
/// Every operation validates before it mutates, so a failed call leaves the
/// store untouched.
pub trait DocumentStorage: Send + Sync {
    /// Allocate a new empty session
    fn create_session(&self) -> SessionId;

    /// Whether a session exists
    fn has_session(&self, session_id: &SessionId) -> bool;

    /// List the documents of a session, sizes only
    fn list_documents(&self, session_id: &SessionId) -> Result<Vec<DocumentSummary>, StorageError>;

    /// Fetch one document including its full text
    fn get_document(
        &self,
        session_id: &SessionId,
        doc_id: &DocumentId,
    ) -> Result<Document, StorageError>;

    /// Case-insensitive search over titles and texts
    ///
    /// Scoped to one session when `session_id` is given, otherwise every
    /// session is searched in creation order. Each matching document yields
    /// exactly one hit.
    fn search_documents(
        &self,
        query: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Vec<SearchHit>, StorageError>;

    /// Append a document to a session
    fn upload_document(
        &self,
        session_id: &SessionId,
        title: String,
        text: String,
    ) -> Result<DocumentId, StorageError>;

    /// Record a question/answer exchange
    fn append_history(&self, session_id: &SessionId, entry: HistoryEntry) -> Result<(), StorageError>;

    /// Interaction history of a session, oldest first
    fn history(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>, StorageError>;

    /// Summaries of every live session in creation order
    fn list_sessions(&self) -> Vec<SessionSummary>;

    /// Summary of one session
    fn session_summary(&self, session_id: &SessionId) -> Result<SessionSummary, StorageError>;
}
