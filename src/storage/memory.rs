/// In-memory implementation of the document storage interface
///
/// Sessions are kept in an insertion-ordered map behind a single lock, so
/// every operation is atomic with respect to every other one.

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::domain::{
    Document, DocumentId, DocumentSession, DocumentSummary, HistoryEntry, SessionId,
};
use crate::storage::{DocumentStorage, SearchHit, SessionSummary, StorageError};

/// Process-lifetime document store
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    sessions: RwLock<IndexMap<SessionId, DocumentSession>>,
}

impl InMemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every session
    pub fn clear(&self) {
        self.sessions.write().clear();
        tracing::debug!("Document store cleared");
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn summarize(session: &DocumentSession) -> SessionSummary {
        SessionSummary {
            session_id: session.id,
            document_count: session.documents.len(),
            documents: session.summaries(),
        }
    }
}

impl DocumentStorage for InMemoryStorage {
    fn create_session(&self) -> SessionId {
        let mut sessions = self.sessions.write();

        let mut session = DocumentSession::new();
        while sessions.contains_key(&session.id) {
            session.id = SessionId::new();
        }
        let id = session.id;
        sessions.insert(id, session);

        tracing::info!("New session created: {}", id);
        id
    }

    fn has_session(&self, session_id: &SessionId) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    fn list_documents(&self, session_id: &SessionId) -> Result<Vec<DocumentSummary>, StorageError> {
        self.sessions
            .read()
            .get(session_id)
            .map(DocumentSession::summaries)
            .ok_or_else(|| StorageError::session_not_found(session_id))
    }

    fn get_document(
        &self,
        session_id: &SessionId,
        doc_id: &DocumentId,
    ) -> Result<Document, StorageError> {
        let sessions = self.sessions.read();
        let session = sessions
            .get(session_id)
            .ok_or_else(|| StorageError::session_not_found(session_id))?;

        session
            .find_document(doc_id)
            .cloned()
            .ok_or_else(|| StorageError::document_not_found(doc_id))
    }

    fn search_documents(
        &self,
        query: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Vec<SearchHit>, StorageError> {
        let sessions = self.sessions.read();

        let scoped: Vec<&DocumentSession> = match session_id {
            Some(id) => vec![sessions
                .get(id)
                .ok_or_else(|| StorageError::session_not_found(id))?],
            None => sessions.values().collect(),
        };

        let hits = scoped
            .into_iter()
            .flat_map(|session| {
                session.documents.iter().filter_map(move |doc| {
                    doc.snippet(query).map(|snippet| SearchHit {
                        session_id: session.id,
                        doc_id: doc.id,
                        title: doc.title.clone(),
                        snippet,
                    })
                })
            })
            .collect();

        Ok(hits)
    }

    fn upload_document(
        &self,
        session_id: &SessionId,
        title: String,
        text: String,
    ) -> Result<DocumentId, StorageError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| StorageError::session_not_found(session_id))?;

        let doc_id = session.add_document(title, text);
        tracing::info!("Uploaded document {} to session {}", doc_id, session_id);
        Ok(doc_id)
    }

    fn append_history(&self, session_id: &SessionId, entry: HistoryEntry) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| StorageError::session_not_found(session_id))?;

        session.history.push(entry);
        Ok(())
    }

    fn history(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>, StorageError> {
        self.sessions
            .read()
            .get(session_id)
            .map(|s| s.history.clone())
            .ok_or_else(|| StorageError::session_not_found(session_id))
    }

    fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.read().values().map(Self::summarize).collect()
    }

    fn session_summary(&self, session_id: &SessionId) -> Result<SessionSummary, StorageError> {
        self.sessions
            .read()
            .get(session_id)
            .map(Self::summarize)
            .ok_or_else(|| StorageError::session_not_found(session_id))
    }
}
