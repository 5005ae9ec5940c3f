//! The generator and validator, as one boundary.

use crate::client::{ChatModel, ChatRequest};
use crate::error::{AgentError, Result};
use crate::prompts;
use crate::validation::ValidationResult;
use async_trait::async_trait;
use deck_core::{BrandPalette, DeckPayload, Presentation, BRAND};
use std::sync::Arc;

/// Sampling temperature of the generator call.
pub const GENERATION_TEMPERATURE: f64 = 0.8;

/// Token budget of the generator call.
pub const GENERATION_MAX_TOKENS: u32 = 4000;

/// Sampling temperature of the validator call.
pub const VALIDATION_TEMPERATURE: f64 = 0.3;

/// Title used when neither the model nor the caller supplies one.
pub const FALLBACK_TITLE: &str = "Presentation";

/// A deck produced by the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDeck {
    pub presentation: Presentation,
    pub key_messages: Vec<String>,
}

impl GeneratedDeck {
    /// Build from a wire payload. The caller's title fills in for a missing one.
    pub fn from_payload(payload: DeckPayload, title: Option<&str>) -> Self {
        let (mut presentation, key_messages) = payload.into_parts();
        if presentation.title.trim().is_empty() {
            presentation.title = title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(FALLBACK_TITLE)
                .to_string();
        }
        Self {
            presentation,
            key_messages,
        }
    }
}

/// Produces decks from source content and judges them.
#[async_trait]
pub trait DeckOracle: Send + Sync {
    /// Turn prepared source content into a deck.
    async fn generate(&self, source: &str, title: Option<&str>) -> Result<GeneratedDeck>;

    /// Judge the current markup and structure against the source.
    async fn validate(
        &self,
        markup: &str,
        payload: &DeckPayload,
        source: &str,
    ) -> Result<ValidationResult>;
}

#[async_trait]
impl<T: DeckOracle + ?Sized> DeckOracle for Arc<T> {
    async fn generate(&self, source: &str, title: Option<&str>) -> Result<GeneratedDeck> {
        (**self).generate(source, title).await
    }

    async fn validate(
        &self,
        markup: &str,
        payload: &DeckPayload,
        source: &str,
    ) -> Result<ValidationResult> {
        (**self).validate(markup, payload, source).await
    }
}

/// [`DeckOracle`] backed by a chat model.
pub struct LlmOracle<M> {
    model: M,
    palette: &'static BrandPalette,
}

impl<M: ChatModel> LlmOracle<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            palette: &BRAND,
        }
    }

    pub fn with_palette(mut self, palette: &'static BrandPalette) -> Self {
        self.palette = palette;
        self
    }
}

#[async_trait]
impl<M: ChatModel> DeckOracle for LlmOracle<M> {
    async fn generate(&self, source: &str, title: Option<&str>) -> Result<GeneratedDeck> {
        let request = ChatRequest::json(
            prompts::generator_system(self.palette),
            prompts::generator_user(source, title),
            GENERATION_TEMPERATURE,
        )
        .with_max_tokens(GENERATION_MAX_TOKENS);

        let content = self.model.complete(request).await?;
        let payload = parse_generated(&content)?;
        Ok(GeneratedDeck::from_payload(payload, title))
    }

    async fn validate(
        &self,
        markup: &str,
        payload: &DeckPayload,
        source: &str,
    ) -> Result<ValidationResult> {
        let payload_json = serde_json::to_string_pretty(payload)
            .map_err(|e| AgentError::Core(deck_core::Error::from(e)))?;
        let request = ChatRequest::json(
            prompts::validator_system(self.palette),
            prompts::validator_user(markup, &payload_json, source),
            VALIDATION_TEMPERATURE,
        );

        let content = self.model.complete(request).await?;
        ValidationResult::from_json(strip_code_fence(&content)).map_err(|e| {
            AgentError::MalformedResponse(format!("validator response is not a verdict: {}", e))
        })
    }
}

/// Parse the generator's answer. It must be a JSON object with at least one
/// slide.
pub(crate) fn parse_generated(content: &str) -> Result<DeckPayload> {
    let value = parse_json_object(content, "generator")?;
    let payload: DeckPayload = serde_json::from_value(value).map_err(|e| {
        AgentError::MalformedResponse(format!("generator response is not a deck: {}", e))
    })?;
    if payload.slides.is_empty() {
        return Err(AgentError::MalformedResponse(
            "generator response has no slides".to_string(),
        ));
    }
    Ok(payload)
}

/// Parse a model answer that must be a single JSON object. `role` names the
/// call in error messages.
pub(crate) fn parse_json_object(content: &str, role: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(content)).map_err(|e| {
        AgentError::MalformedResponse(format!("{} response is not JSON: {}", role, e))
    })?;
    if !value.is_object() {
        return Err(AgentError::MalformedResponse(format!(
            "{} response is not a JSON object",
            role
        )));
    }
    Ok(value)
}

/// Drop a surrounding Markdown code fence, which some models add even in JSON
/// mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
