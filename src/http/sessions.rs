/// Plain REST facades over the document store
///
/// These routes sit beside the MCP transport so browser clients can create
/// sessions, upload files and ask questions without speaking JSON-RPC.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::completion::{build_prompt, QueryMode};
use crate::domain::{DocumentId, HistoryEntry, SessionId};
use crate::extract::extract_text;
use crate::http::{ApiError, AppState};
use crate::storage::StorageError;

/// Title given to uploads that do not name themselves
pub const DEFAULT_TITLE: &str = "Untitled";

const NO_TEXT: &str = "No document text provided.";

/// JSON upload body
#[derive(Debug, Default, Deserialize)]
pub struct UploadBody {
    pub title: Option<String>,
    pub text: Option<String>,
}

/// Query body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBody {
    pub doc_id: Option<String>,
    #[serde(default)]
    pub query: String,
    pub mode: Option<String>,
}

/// A file pulled out of a multipart form
struct UploadedFile {
    bytes: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

pub async fn create_session(State(state): State<AppState>) -> Json<Value> {
    let session_id = state.storage.create_session();
    Json(json!({ "sessionId": session_id }))
}

/// Accept a document as JSON text or as a multipart file upload
pub async fn upload_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    let session_id = existing_session(&state, &session_id)?;

    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let (title, text) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        read_form(multipart).await?
    } else {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let upload: UploadBody = serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload body: {e}")))?;
        (upload.title, upload.text.unwrap_or_default())
    };

    if text.is_empty() {
        return Err(ApiError::BadRequest(NO_TEXT.to_string()));
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let doc_id = state.storage.upload_document(&session_id, title, text)?;

    Ok(Json(json!({ "docId": doc_id })))
}

/// Read `file`, `title` and `text` fields; a file wins over inline text
async fn read_form(mut multipart: Multipart) -> Result<(Option<String>, String), ApiError> {
    let mut title = None;
    let mut inline_text = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                file = Some(UploadedFile {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            "title" | "text" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                if name == "title" {
                    title = Some(value);
                } else {
                    inline_text = Some(value);
                }
            }
            other => debug!("Ignoring form field '{}'", other),
        }
    }

    let text = match file {
        Some(file) => extract(file).await?,
        None => inline_text.unwrap_or_default(),
    };

    Ok((title, text))
}

async fn extract(file: UploadedFile) -> Result<String, ApiError> {
    let UploadedFile {
        bytes,
        content_type,
        file_name,
    } = file;

    let text = tokio::task::spawn_blocking(move || {
        extract_text(&bytes, content_type.as_deref(), file_name.as_deref())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Failed to parse file: {e}")))??;

    Ok(text)
}

/// Summarize a document or answer a question about it
pub async fn query_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let session_id = existing_session(&state, &session_id)?;

    let body: QueryBody = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid query body: {e}")))?;

    let doc_id = body
        .doc_id
        .as_deref()
        .and_then(|raw| DocumentId::from_string(raw).ok())
        .ok_or_else(|| ApiError::from(StorageError::document_not_found("")))?;
    let document = state.storage.get_document(&session_id, &doc_id)?;

    let mode = QueryMode::from_param(body.mode.as_deref());
    let prompt = build_prompt(mode, &document.text, &body.query);

    info!("Querying document {} in session {} ({:?})", doc_id, session_id, mode);
    let answer = state.completion.complete(&prompt).await?;

    state
        .storage
        .append_history(&session_id, HistoryEntry::new(body.query, answer.clone()))?;

    Ok(Json(json!({ "answer": answer })))
}

pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session_id = existing_session(&state, &session_id)?;
    let history = state.storage.history(&session_id)?;

    Ok(Json(json!({ "sessionId": session_id, "history": history })))
}

/// Parse a path session id, answering 404 when it is malformed or unknown
fn existing_session(state: &AppState, raw: &str) -> Result<SessionId, ApiError> {
    SessionId::from_string(raw)
        .ok()
        .filter(|id| state.storage.has_session(id))
        .ok_or_else(|| StorageError::session_not_found(raw).into())
}
