use crate::wire::{ChatMessage, ChatResponse, ToolSpec};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the inference service
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("empty response from inference service")]
    EmptyResponse,
}

/// The replaceable inference collaborator.
///
/// The loop only depends on this contract: the whole conversation plus the
/// tool declarations go in, either plain text or tool-call requests come out.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatResponse, ChatError>;
}

/// Client for Ollama's `/api/chat` endpoint with tool support
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    http: reqwest::Client,
}

/// Ceiling on a single generation; local models can be slow, but a hung
/// server must not wedge the loop forever.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            http,
        }
    }
}

/// Forwarding impl so a shared `Arc<B>` is itself usable as a backend.
#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatResponse, ChatError> {
        (**self).chat(model, messages, tools).await
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatResponse, ChatError> {
        let endpoint = format!("{}/api/chat", self.base_url.trim_end_matches('/'));

        // Temperature 0 keeps tool-call emission as deterministic as the
        // model allows.
        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": 0.0 }
        });
        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(tools)?;
        }

        let response = self.http.post(&endpoint).json(&body).send().await?;
        let text = response.text().await?;
        if text.is_empty() {
            return Err(ChatError::EmptyResponse);
        }

        Ok(serde_json::from_str(&text)?)
    }
}
