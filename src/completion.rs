/// Upstream language-model completion client
///
/// The query facade turns a stored document into a prompt and asks an
/// OpenAI-compatible chat-completions endpoint for an answer. Every failure,
/// including network errors, comes back as a [`CompletionError`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::CompletionConfig;

/// Answer used when the upstream reply carries neither content nor an error
pub const NO_RESPONSE: &str = "No response from model";

/// Errors from the completion endpoint
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion endpoint is not configured")]
    NotConfigured,

    #[error("Invalid completion endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// How a document should be turned into a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Summarize the whole document
    #[default]
    Summarize,
    /// Answer a question about the document
    Answer,
}

impl QueryMode {
    /// `"qa"` selects question answering, anything else summarizes
    pub fn from_param(mode: Option<&str>) -> Self {
        match mode {
            Some("qa") => QueryMode::Answer,
            _ => QueryMode::Summarize,
        }
    }
}

/// Build the prompt sent upstream for a document
pub fn build_prompt(mode: QueryMode, document_text: &str, query: &str) -> String {
    match mode {
        QueryMode::Answer => {
            format!("Document:\n{document_text}\n\nQuestion: {query}\nAnswer:")
        }
        QueryMode::Summarize => {
            format!("Summarize the following document:\n\n{document_text}\n\nSummary:")
        }
    }
}

/// Something that can answer a prompt
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Stand-in used when no endpoint is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCompletion;

#[async_trait]
impl CompletionClient for DisabledCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Err(CompletionError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

/// Chat-completions client authenticated with an `api-key` header
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_tokens: u32,
}

impl HttpCompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let parsed = reqwest::Url::parse(&config.endpoint)
            .map_err(|_| CompletionError::InvalidEndpoint(config.endpoint.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CompletionError::InvalidEndpoint(config.endpoint.clone()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(config.timeout)
            .build()?;

        info!("Completion client created for {}", parsed.host_str().unwrap_or("?"));

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatCompletionRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        debug!("Sending completion request ({} prompt chars)", prompt.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                CompletionError::Request(e)
            })?;

        let status = response.status();
        let payload: Value = response.json().await?;
        debug!("Completion endpoint answered with {}", status);

        answer_from(status.is_success(), &payload)
    }
}

/// Pull the answer text out of a chat-completions reply
fn answer_from(success: bool, payload: &Value) -> Result<String, CompletionError> {
    let content = payload
        .pointer("/choices/0/message/content")
        .or_else(|| payload.pointer("/choices/0/content"))
        .and_then(Value::as_str);
    if let Some(answer) = content {
        return Ok(answer.to_string());
    }

    if let Some(message) = payload.pointer("/error/message").and_then(Value::as_str) {
        return Err(CompletionError::Upstream(message.to_string()));
    }
    if !success {
        return Err(CompletionError::Upstream("upstream returned an error status".to_string()));
    }
    Ok(NO_RESPONSE.to_string())
}
