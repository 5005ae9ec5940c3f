//! Diagram specifications from free-text descriptions.

use crate::client::{self, ChatModel, ChatRequest};
use crate::config::{AgentConfig, DEFAULT_CALL_TIMEOUT_SECS};
use crate::error::{AgentError, Result};
use crate::oracle::parse_json_object;
use crate::prompts;
use crate::OpenAiChatModel;
use deck_core::{BrandPalette, DiagramSpec, TextNormalizer, BRAND};
use std::time::Duration;

/// Sampling temperature of the diagram call.
pub const DIAGRAM_TEMPERATURE: f64 = 0.7;

/// Token budget of the diagram call.
pub const DIAGRAM_MAX_TOKENS: u32 = 3000;

/// Longest description sent to the model, in characters.
pub const DIAGRAM_MAX_CHARS: usize = 30_000;

/// Turns descriptions into [`DiagramSpec`]s through a chat model.
pub struct DiagramGenerator<M> {
    model: M,
    normalizer: TextNormalizer,
    palette: &'static BrandPalette,
    call_timeout: Duration,
}

impl DiagramGenerator<OpenAiChatModel> {
    /// Generator talking to the configured chat model.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let model = OpenAiChatModel::new(config.provider.clone(), config.call_timeout)?;
        Ok(DiagramGenerator::new(model).with_call_timeout(config.call_timeout))
    }
}

impl<M: ChatModel> DiagramGenerator<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            normalizer: TextNormalizer::new().with_max_chars(DIAGRAM_MAX_CHARS),
            palette: &BRAND,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    pub fn with_palette(mut self, palette: &'static BrandPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Ask the model for a diagram of `description`. A diagram without nodes
    /// is rejected.
    pub async fn generate(&self, description: &str) -> Result<DiagramSpec> {
        let description = self.normalizer.prepare(description)?;
        log::info!("Generating diagram from {} characters", description.chars().count());

        let request = ChatRequest::json(
            prompts::diagram_system(self.palette),
            prompts::diagram_user(&description),
            DIAGRAM_TEMPERATURE,
        )
        .with_max_tokens(DIAGRAM_MAX_TOKENS);
        let content = client::timed(self.call_timeout, self.model.complete(request)).await?;

        let spec: DiagramSpec = serde_json::from_value(parse_json_object(&content, "diagram")?)
            .map_err(|e| AgentError::MalformedResponse(format!("diagram response is not a diagram: {}", e)))?;
        if spec.nodes.is_empty() {
            return Err(AgentError::MalformedResponse("diagram has no nodes".to_string()));
        }

        let dangling = spec.connections.len() - spec.resolved_connections().count();
        if dangling > 0 {
            log::warn!("{} diagram connection(s) name unknown nodes and will not be drawn", dangling);
        }
        log::info!(
            "Diagram '{}' has {} nodes and {} connections",
            spec.title,
            spec.nodes.len(),
            spec.connections.len()
        );
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CannedModel;
    use deck_core::{DiagramKind, NodeShape};

    const DIAGRAM: &str = r##"```json
    {
        "title": "Order flow",
        "type": "architecture",
        "nodes": [
            {"id": "web", "label": "Web", "type": "rectangle", "layer": 1,
             "position": {"x": 100, "y": 100}, "color": "#FF0000"},
            {"id": "db", "label": "Orders", "type": "cylinder", "layer": 3}
        ],
        "connections": [
            {"from": "web", "to": "db", "label": "writes"},
            {"from": "web", "to": "cache"}
        ]
    }
    ```"##;

    #[tokio::test]
    async fn test_generate() {
        let generator = DiagramGenerator::new(CannedModel::new(&[DIAGRAM]));
        let spec = generator.generate("/diagram web app writing orders").await.unwrap();

        assert_eq!(spec.title, "Order flow");
        assert_eq!(spec.kind, DiagramKind::Architecture);
        assert_eq!(spec.nodes.len(), 2);
        assert_eq!(spec.nodes[1].shape, NodeShape::Cylinder);
        assert_eq!(spec.nodes[1].layer, Some(3));
        // The dangling connection is kept but never resolved
        assert_eq!(spec.connections.len(), 2);
        assert_eq!(spec.resolved_connections().count(), 1);
        // Model colors are not kept
        assert!(!serde_json::to_string(&spec).unwrap().contains("FF0000"));

        let seen = generator.model.seen();
        assert_eq!(seen[0].temperature, DIAGRAM_TEMPERATURE);
        assert_eq!(seen[0].max_tokens, Some(DIAGRAM_MAX_TOKENS));
        assert!(seen[0].messages[0].content.contains(&BRAND.primary.css()));
        assert!(seen[0].messages[1].content.ends_with("web app writing orders"));
    }

    #[tokio::test]
    async fn test_description_is_bounded() {
        let generator = DiagramGenerator::new(CannedModel::new(&[DIAGRAM]));
        generator.generate(&"x".repeat(DIAGRAM_MAX_CHARS * 2)).await.unwrap();
        let sent = &generator.model.seen()[0].messages[1].content;
        assert!(sent.chars().count() < DIAGRAM_MAX_CHARS + 100);

        let err = generator.generate("tiny").await.unwrap_err();
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_rejects_diagrams_without_nodes() {
        for answer in ["a box and an arrow", r#"{"title": "Empty", "nodes": []}"#, r#"{"nodes": 3}"#] {
            let generator = DiagramGenerator::new(CannedModel::new(&[answer]));
            let err = generator.generate("a small architecture diagram").await.unwrap_err();
            assert!(matches!(err, AgentError::MalformedResponse(_)), "{}", answer);
        }
    }
}
