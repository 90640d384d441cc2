//! Chat-completion client speaking the OpenAI `/v1/chat/completions` protocol.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use pdfrag_core::config::CompletionSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The service refused the credential (HTTP 401/403).
    #[error("credential rejected by completion service: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Request(String),
}

pub trait CompletionClient: Send + Sync {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<serde_json::Value>,
}

pub struct OpenAiChatClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl OpenAiChatClient {
    pub fn new(settings: &CompletionSettings, api_key: &str) -> Result<Self, CompletionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Request(format!("failed to create HTTP client: {e}")))?;
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        tracing::info!("Completion client: {} at {}", settings.model, base_url);
        Ok(Self {
            client,
            base_url,
            model: settings.model.clone(),
            temperature: settings.temperature,
            api_key: api_key.to_string(),
        })
    }
}

impl CompletionClient for OpenAiChatClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest { model: &self.model, messages, temperature: self.temperature };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| CompletionError::Request(format!("failed to reach {}: {e}", self.base_url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.to_string())
                .unwrap_or(body);
            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    CompletionError::Unauthorized(format!("{status}: {message}"))
                }
                _ => CompletionError::Request(format!("completion API error ({status}): {message}")),
            });
        }

        let resp: ChatResponse = response
            .json()
            .map_err(|e| CompletionError::Request(format!("failed to parse completion response: {e}")))?;
        let text = resp.choices.into_iter().filter_map(|c| c.message.content).collect::<Vec<_>>().join("");
        if text.is_empty() {
            return Err(CompletionError::Request("completion service returned an empty answer".to_string()));
        }
        Ok(text)
    }
}
