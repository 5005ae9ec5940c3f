//! Chat completion client.
//!
//! The model is a black box behind [`ChatModel`]: one system message, one user
//! message, a few sampling knobs, and the raw assistant text back.
//! [`OpenAiChatModel`] speaks the OpenAI chat completions protocol, either
//! against the public API or against an Azure OpenAI deployment.

use crate::config::Provider;
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Characters of an error body kept in [`AgentError::Status`].
const ERROR_BODY_PREVIEW: usize = 1000;

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    /// Ask the model for a JSON object instead of free text.
    pub json_object: bool,
}

impl ChatRequest {
    /// A system + user exchange expecting a JSON object back.
    pub fn json(system: impl Into<String>, user: impl Into<String>, temperature: f64) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
            max_tokens: None,
            json_object: true,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Something that answers chat completion requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the request and return the assistant's message content.
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Arc<T> {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        (**self).complete(request).await
    }
}

/// Run `call` within `timeout`; expiry becomes [`AgentError::Timeout`].
pub(crate) async fn timed<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| AgentError::Timeout(timeout.as_secs()))?
}

/// [`ChatModel`] over HTTP, for OpenAI and Azure OpenAI.
pub struct OpenAiChatModel {
    provider: Provider,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(provider: Provider, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { provider, client })
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    fn request_body(&self, request: ChatRequest) -> CompletionRequest {
        CompletionRequest {
            model: self.provider.model().to_string(),
            messages: request.messages,
            temperature: Some(request.temperature),
            max_tokens: request.max_tokens,
            response_format: request.json_object.then(ResponseFormat::json_object),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let url = self.provider.completions_url();
        let body = self.request_body(request);

        let builder = self.client.post(&url).json(&body);
        let builder = match &self.provider {
            Provider::Azure { api_key, .. } => builder.header("api-key", api_key),
            Provider::OpenAi { api_key, .. } => {
                builder.header("Authorization", format!("Bearer {}", api_key))
            }
        };

        log::debug!("POST {} (model {})", url, body.model);
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Http(format!("request to {} timed out: {}", url, e))
            } else {
                AgentError::Http(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| AgentError::Http(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(AgentError::Status {
                code: status.as_u16(),
                body: raw_body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        parse_completion(&raw_body)
    }
}

/// Pull the first choice's content out of a chat completions response body.
pub(crate) fn parse_completion(raw_body: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(raw_body).map_err(|e| {
        AgentError::MalformedResponse(format!("Failed to parse completion response: {}", e))
    })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::MalformedResponse("response has no choices".to_string()))?;

    if choice.finish_reason.as_deref() == Some("length") {
        log::warn!("Model output was cut at the token limit");
    }

    choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AgentError::MalformedResponse("response message is empty".to_string()))
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl ResponseFormat {
    fn json_object() -> Self {
        Self {
            kind: "json_object",
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}
