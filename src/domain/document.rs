/// Document and DocumentSession entities
///
/// A session is an ordered collection of uploaded documents plus the history
/// of questions asked against them. Documents never change after upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DocumentId, SessionId};

/// Characters of context kept on each side of a search match
pub const SNIPPET_CONTEXT: usize = 50;

/// Marker wrapped around both ends of a snippet
pub const SNIPPET_ELLIPSIS: &str = "...";

/// An uploaded document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub text: String,
}

/// Size-only view of a document, used wherever full text would be too much
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: String,
    pub text_length: usize,
}

/// One question/answer exchange recorded against a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub query: String,
    pub response: String,
    pub asked_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(query: String, response: String) -> Self {
        Self {
            query,
            response,
            asked_at: Utc::now(),
        }
    }
}

/// A collection of documents and the interaction history built on them
#[derive(Debug, Clone)]
pub struct DocumentSession {
    pub id: SessionId,
    /// Documents in upload order
    pub documents: Vec<Document>,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl DocumentSession {
    /// Create an empty session with a fresh ID
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            documents: Vec::new(),
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a document and return the ID it was stored under
    pub fn add_document(&mut self, title: String, text: String) -> DocumentId {
        let mut id = DocumentId::new();
        while self.find_document(&id).is_some() {
            id = DocumentId::new();
        }

        self.documents.push(Document { id, title, text });
        id
    }

    /// Linear lookup, first match wins
    pub fn find_document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| &d.id == id)
    }

    pub fn summaries(&self) -> Vec<DocumentSummary> {
        self.documents.iter().map(Document::summary).collect()
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Length of the text in characters
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            title: self.title.clone(),
            text_length: self.text_length(),
        }
    }

    /// Build a search snippet if the query occurs in the title or the text
    ///
    /// Matching ignores case. Only the first occurrence in the text is used:
    /// the snippet holds up to [`SNIPPET_CONTEXT`] characters on either side
    /// of it, clipped to the text bounds. When only the title matches, the
    /// window starts one character before the text does, so it keeps
    /// `query.len() + SNIPPET_CONTEXT - 1` leading characters.
    pub fn snippet(&self, query: &str) -> Option<String> {
        let needle: Vec<char> = query.chars().collect();
        let text: Vec<char> = self.text.chars().collect();

        let (start, end) = match find_ignore_case(&text, &needle) {
            Some(index) => (
                index.saturating_sub(SNIPPET_CONTEXT),
                (index + needle.len() + SNIPPET_CONTEXT).min(text.len()),
            ),
            None => {
                let title: Vec<char> = self.title.chars().collect();
                find_ignore_case(&title, &needle)?;
                (0, (needle.len() + SNIPPET_CONTEXT - 1).min(text.len()))
            }
        };

        let window: String = text[start..end].iter().collect();
        Some(format!("{SNIPPET_ELLIPSIS}{window}{SNIPPET_ELLIPSIS}"))
    }
}

/// Char index of the first case-insensitive occurrence of `needle`
fn find_ignore_case(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }

    (0..=haystack.len() - needle.len()).find(|&start| {
        haystack[start..start + needle.len()]
            .iter()
            .zip(needle)
            .all(|(a, b)| chars_eq_ignore_case(*a, *b))
    })
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
