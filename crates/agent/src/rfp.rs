//! Structured summaries of tender documents.
//!
//! One model call turns the document into a JSON summary with a fixed set of
//! French-keyed sections. Only the parts the service acts on are typed; the
//! rest is carried through untouched.

use crate::client::{self, ChatModel, ChatRequest};
use crate::config::{AgentConfig, DEFAULT_CALL_TIMEOUT_SECS};
use crate::error::{AgentError, Result};
use crate::oracle::parse_json_object;
use crate::prompts;
use crate::OpenAiChatModel;
use deck_core::text::MAX_SOURCE_CHARS;
use deck_core::TextNormalizer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Sampling temperature of the summary call.
pub const RFP_TEMPERATURE: f64 = 0.2;

/// Token budget of the summary call.
pub const RFP_MAX_TOKENS: u32 = 4000;

/// Shortest tender document accepted, in characters.
pub const RFP_MIN_CHARS: usize = 50;

/// How soon the offer is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Under 10 days left.
    Critical,
    /// Under 20 days left, or unclear.
    High,
    Standard,
}

impl Urgency {
    /// Parse the summary's label (`CRITIQUE`, `ÉLEVÉ`, `STANDARD`), with or
    /// without accents, or its English equivalent.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "CRITIQUE" | "CRITICAL" => Some(Urgency::Critical),
            "ÉLEVÉ" | "ELEVE" | "HIGH" => Some(Urgency::High),
            "STANDARD" => Some(Urgency::Standard),
            _ => None,
        }
    }
}

/// A tender summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RfpSummary {
    /// Risks, ambiguities and atypical clauses.
    #[serde(default)]
    pub points_attention: Vec<String>,

    /// Conditions that disqualify an offer outright.
    #[serde(default)]
    pub criteres_eliminatoires: Vec<String>,

    /// Every other section, as returned.
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

impl RfpSummary {
    fn field(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The three-line executive summary.
    pub fn executive_summary(&self) -> Option<&str> {
        self.field("identification_marche", "synthese_executive")
    }

    /// Who issued the tender.
    pub fn client(&self) -> Option<&str> {
        self.field("identification_marche", "client_emetteur")
    }

    /// Offer deadline, as written in the summary.
    pub fn offer_deadline(&self) -> Option<&str> {
        self.field("calendrier", "date_limite_offres")
    }

    /// Urgency level, when the summary states a known one.
    pub fn urgency(&self) -> Option<Urgency> {
        self.field("calendrier", "niveau_urgence")
            .and_then(Urgency::from_label)
    }

    fn is_empty(&self) -> bool {
        self.points_attention.is_empty()
            && self.criteres_eliminatoires.is_empty()
            && self.sections.is_empty()
    }
}

/// Summarizes tender documents through a chat model.
pub struct RfpSummarizer<M> {
    model: M,
    normalizer: TextNormalizer,
    call_timeout: Duration,
}

impl RfpSummarizer<OpenAiChatModel> {
    /// Summarizer talking to the configured chat model.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let model = OpenAiChatModel::new(config.provider.clone(), config.call_timeout)?;
        Ok(RfpSummarizer::new(model).with_call_timeout(config.call_timeout))
    }
}

impl<M: ChatModel> RfpSummarizer<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            normalizer: TextNormalizer::new()
                .with_min_chars(RFP_MIN_CHARS)
                .with_max_chars(MAX_SOURCE_CHARS),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Summarize `document`. Documents shorter than [`RFP_MIN_CHARS`] are
    /// rejected before any call is made.
    pub async fn summarize(&self, document: &str) -> Result<RfpSummary> {
        let document = self.normalizer.prepare(document)?;
        log::info!("Summarizing tender of {} characters", document.chars().count());

        let request = ChatRequest::json(prompts::rfp_system(), prompts::rfp_user(&document), RFP_TEMPERATURE)
            .with_max_tokens(RFP_MAX_TOKENS);
        let content = client::timed(self.call_timeout, self.model.complete(request)).await?;

        let summary: RfpSummary = serde_json::from_value(parse_json_object(&content, "summary")?)
            .map_err(|e| AgentError::MalformedResponse(format!("summary has unexpected shape: {}", e)))?;
        if summary.is_empty() {
            return Err(AgentError::MalformedResponse("summary is empty".to_string()));
        }

        match summary.urgency() {
            Some(urgency) => log::info!("Tender summarized, urgency {:?}", urgency),
            None => log::warn!("Tender summary states no known urgency level"),
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CannedModel;

    const TENDER: &str = "Appel d'offres pour la tierce maintenance applicative du SI \
                          de la Région, remise des offres le 15 mars.";

    const SUMMARY: &str = r#"{
        "identification_marche": {
            "client_emetteur": "Région Sud",
            "synthese_executive": "TMA du SI régional, 3 lots."
        },
        "calendrier": {"date_limite_offres": "15/03/2025", "niveau_urgence": "ÉLEVÉ"},
        "lots": [{"numero": 1, "intitule": "TMA"}],
        "points_attention": ["Pénalités non plafonnées"],
        "criteres_eliminatoires": ["Certification ISO 27001"]
    }"#;

    #[tokio::test]
    async fn test_summarize() {
        let summarizer = RfpSummarizer::new(CannedModel::new(&[SUMMARY]));
        let summary = summarizer.summarize(&format!("/rfp {}", TENDER)).await.unwrap();

        assert_eq!(summary.client(), Some("Région Sud"));
        assert_eq!(summary.executive_summary(), Some("TMA du SI régional, 3 lots."));
        assert_eq!(summary.offer_deadline(), Some("15/03/2025"));
        assert_eq!(summary.urgency(), Some(Urgency::High));
        assert_eq!(summary.points_attention, vec!["Pénalités non plafonnées"]);
        assert_eq!(summary.criteres_eliminatoires.len(), 1);
        // Untyped sections come back as returned
        assert_eq!(summary.sections["lots"][0]["intitule"], "TMA");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["calendrier"]["niveau_urgence"], "ÉLEVÉ");
        assert_eq!(json["points_attention"][0], "Pénalités non plafonnées");

        let seen = summarizer.model.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, RFP_TEMPERATURE);
        assert_eq!(seen[0].max_tokens, Some(RFP_MAX_TOKENS));
        assert!(seen[0].json_object);
        // The chat command is not part of the document
        assert!(!seen[0].messages[1].content.contains("/rfp"));
    }

    #[tokio::test]
    async fn test_short_document_is_rejected_without_a_call() {
        let summarizer = RfpSummarizer::new(CannedModel::new(&[SUMMARY]));
        let err = summarizer.summarize("Tender, due Friday.").await.unwrap_err();
        assert!(err.is_input_error());
        assert!(summarizer.model.seen().is_empty());
    }

    #[tokio::test]
    async fn test_long_document_is_truncated() {
        let summarizer = RfpSummarizer::new(CannedModel::new(&[SUMMARY]));
        let long = "a".repeat(MAX_SOURCE_CHARS + 500);
        summarizer.summarize(&long).await.unwrap();
        let sent = &summarizer.model.seen()[0].messages[1].content;
        assert!(sent.ends_with(deck_core::text::TRUNCATION_MARKER));
        assert!(!sent.contains(&"a".repeat(MAX_SOURCE_CHARS + 1)));
    }

    #[tokio::test]
    async fn test_malformed_summaries() {
        for answer in ["Voici le résumé", "[]", "{}", r#"{"points_attention": "none"}"#] {
            let summarizer = RfpSummarizer::new(CannedModel::new(&[answer]));
            let err = summarizer.summarize(TENDER).await.unwrap_err();
            assert!(matches!(err, AgentError::MalformedResponse(_)), "{}", answer);
        }
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let summarizer = RfpSummarizer::new(CannedModel::new(&[SUMMARY]).with_delay(Duration::from_millis(200)))
            .with_call_timeout(Duration::from_millis(20));
        let err = summarizer.summarize(TENDER).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)));
    }

    #[test]
    fn test_urgency_labels() {
        assert_eq!(Urgency::from_label("critique"), Some(Urgency::Critical));
        assert_eq!(Urgency::from_label(" ELEVE "), Some(Urgency::High));
        assert_eq!(Urgency::from_label("STANDARD"), Some(Urgency::Standard));
        assert_eq!(Urgency::from_label("NON SPÉCIFIÉ"), None);
    }
}
