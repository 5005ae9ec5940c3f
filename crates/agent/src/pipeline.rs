//! The generation-validation loop.
//!
//! One generator call produces a deck; up to `max_iterations` validator calls
//! then judge it. A `valid` verdict ends the loop at once. A verdict carrying a
//! correction replaces the whole deck, re-renders the markup and, budget
//! permitting, goes back to validation. A verdict without a usable correction
//! ends the loop with a warning; the loop never retries without one.
//!
//! Failures of the calls themselves (transport, timeout, unreadable answer)
//! are not retried and abort the run.

use crate::client::{self, OpenAiChatModel};
use crate::config::{AgentConfig, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_MAX_ITERATIONS};
use crate::error::Result;
use crate::oracle::{DeckOracle, GeneratedDeck, LlmOracle};
use crate::validation::{ValidationResult, ValidationStatus};
use deck_core::{BrandPalette, DeckPayload, Presentation, TextNormalizer, BRAND};
use deck_html::MarkupBuilder;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOutcome {
    /// The validator accepted the deck, or the budget ran out after a
    /// correction was applied.
    Accepted,
    /// The validator flagged the deck without offering a correction.
    AcceptedWithWarning,
}

/// One validation round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    /// 1-based.
    pub iteration: usize,
    pub validation: ValidationResult,
    /// Length in bytes of the markup that was validated.
    pub markup_length: usize,
}

/// Result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedDeck {
    pub markup: String,
    pub presentation: Presentation,
    pub key_messages: Vec<String>,
    pub history: Vec<IterationRecord>,
    pub iterations: usize,
    pub outcome: LoopOutcome,
    pub final_status: ValidationStatus,
}

impl ValidatedDeck {
    /// The verdict of the last iteration.
    pub fn last_validation(&self) -> Option<&ValidationResult> {
        self.history.last().map(|record| &record.validation)
    }
}

/// Drives an oracle through one generation and a bounded validation loop.
pub struct DeckPipeline<O> {
    oracle: O,
    max_iterations: usize,
    call_timeout: Duration,
    normalizer: TextNormalizer,
    palette: &'static BrandPalette,
    markup_date: Option<String>,
}

impl DeckPipeline<LlmOracle<OpenAiChatModel>> {
    /// Pipeline talking to the configured chat model.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let model = OpenAiChatModel::new(config.provider.clone(), config.call_timeout)?;
        Ok(DeckPipeline::new(LlmOracle::new(model))
            .with_max_iterations(config.max_iterations)
            .with_call_timeout(config.call_timeout))
    }
}

impl<O: DeckOracle> DeckPipeline<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            normalizer: TextNormalizer::new(),
            palette: &BRAND,
            markup_date: None,
        }
    }

    /// Set the validation budget. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the time budget of each generator or validator call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_palette(mut self, palette: &'static BrandPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Fix the date printed in the markup instead of using today's.
    pub fn with_markup_date(mut self, date: impl Into<String>) -> Self {
        self.markup_date = Some(date.into());
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Generate and validate a deck for `source`.
    ///
    /// The source is normalized first; content that is too short is rejected
    /// before any call is made.
    pub async fn run(&self, source: &str, title: Option<&str>) -> Result<ValidatedDeck> {
        let source = self.normalizer.prepare(source)?;

        log::info!("Generating deck from {} characters of source", source.chars().count());
        let GeneratedDeck {
            mut presentation,
            mut key_messages,
        } = self.timed(self.oracle.generate(&source, title)).await?;
        let mut markup = self.render_markup(&presentation)?;

        let mut history = Vec::new();
        let mut outcome = LoopOutcome::Accepted;

        for iteration in 1..=self.max_iterations {
            let payload = self.payload(&presentation, &key_messages);
            let validation = self
                .timed(self.oracle.validate(&markup, &payload, &source))
                .await?;
            log::info!(
                "Validation {}/{}: {} ({} issues)",
                iteration,
                self.max_iterations,
                validation.status,
                validation.issue_count()
            );

            let status = validation.status;
            let correction = validation.correction().cloned();
            history.push(IterationRecord {
                iteration,
                validation,
                markup_length: markup.len(),
            });

            if status == ValidationStatus::Valid {
                break;
            }

            match correction {
                Some(corrected) => {
                    log::debug!("Applying correction with {} slides", corrected.slides.len());
                    let (corrected, messages) = corrected.into_parts();
                    presentation = replace_deck(presentation, corrected);
                    if !messages.is_empty() {
                        key_messages = messages;
                    }
                    markup = self.render_markup(&presentation)?;
                }
                None => {
                    log::warn!(
                        "Validator returned '{}' without a correction; keeping the current deck",
                        status
                    );
                    outcome = LoopOutcome::AcceptedWithWarning;
                    break;
                }
            }
        }

        let final_status = history
            .last()
            .map(|record| record.validation.status)
            .unwrap_or_default();
        if outcome == LoopOutcome::Accepted && final_status != ValidationStatus::Valid {
            log::warn!(
                "Validation budget of {} spent; accepting deck with status '{}'",
                self.max_iterations,
                final_status
            );
        }

        Ok(ValidatedDeck {
            markup,
            presentation,
            key_messages,
            iterations: history.len(),
            history,
            outcome,
            final_status,
        })
    }

    fn render_markup(&self, presentation: &Presentation) -> Result<String> {
        let builder = MarkupBuilder::new().with_palette(self.palette);
        let builder = match &self.markup_date {
            Some(date) => builder.with_date(date.clone()),
            None => builder,
        };
        Ok(builder.build(presentation)?)
    }

    fn payload(&self, presentation: &Presentation, key_messages: &[String]) -> DeckPayload {
        let mut payload = DeckPayload::from(presentation.clone());
        payload.key_messages = key_messages.to_vec();
        payload
    }

    async fn timed<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        client::timed(self.call_timeout, call).await
    }
}

/// Swap in a corrected deck wholesale, keeping the old deck title when the
/// correction leaves it blank.
fn replace_deck(current: Presentation, mut corrected: Presentation) -> Presentation {
    if corrected.title.trim().is_empty() {
        corrected.title = current.title;
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use async_trait::async_trait;
    use deck_core::{Slide, SlideKind, SlidePayload};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Oracle answering from a script of verdicts.
    struct ScriptedOracle {
        deck: Option<GeneratedDeck>,
        verdicts: Mutex<VecDeque<ValidationResult>>,
        /// Returned once the script runs out.
        fallback: ValidationResult,
        generate_calls: AtomicUsize,
        validate_calls: AtomicUsize,
        seen_markup: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedOracle {
        fn new(verdicts: Vec<ValidationResult>) -> Self {
            Self {
                deck: Some(sample_deck()),
                verdicts: Mutex::new(verdicts.into()),
                fallback: ValidationResult::valid(),
                generate_calls: AtomicUsize::new(0),
                validate_calls: AtomicUsize::new(0),
                seen_markup: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn always(verdict: ValidationResult) -> Self {
            let mut oracle = Self::new(Vec::new());
            oracle.fallback = verdict;
            oracle
        }

        fn failing_generation() -> Self {
            let mut oracle = Self::new(Vec::new());
            oracle.deck = None;
            oracle
        }

        fn generations(&self) -> usize {
            self.generate_calls.load(Ordering::SeqCst)
        }

        fn validations(&self) -> usize {
            self.validate_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeckOracle for ScriptedOracle {
        async fn generate(&self, _source: &str, _title: Option<&str>) -> Result<GeneratedDeck> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.deck
                .clone()
                .ok_or_else(|| AgentError::MalformedResponse("not JSON".to_string()))
        }

        async fn validate(
            &self,
            markup: &str,
            _payload: &DeckPayload,
            _source: &str,
        ) -> Result<ValidationResult> {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            self.seen_markup.lock().unwrap().push(markup.to_string());
            let next = self.verdicts.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| self.fallback.clone()))
        }
    }

    const SOURCE: &str = "Our cloud migration cuts costs and improves resilience.";

    fn sample_deck() -> GeneratedDeck {
        let mut presentation = Presentation::new("Cloud").with_subtitle("Why now");
        presentation.add_slide(Slide::title("Cloud", "Why now"));
        presentation.add_slide(Slide::content("Benefits", ["Fast", "Secure", "Scalable"]));
        presentation.add_slide(Slide::conclusion("Next steps", ["Pilot in Q1"]));
        GeneratedDeck {
            presentation,
            key_messages: vec!["Move fast".to_string()],
        }
    }

    fn verdict(status: ValidationStatus) -> ValidationResult {
        ValidationResult {
            status,
            ..ValidationResult::default()
        }
    }

    fn correction(title: &str) -> ValidationResult {
        ValidationResult {
            status: ValidationStatus::Invalid,
            charter_violations: vec!["pink heading".to_string()],
            needs_correction: true,
            corrected_payload: Some(DeckPayload {
                title: Some(title.to_string()),
                slides: vec![
                    SlidePayload {
                        kind: Some("title".to_string()),
                        title: Some(title.to_string()),
                        ..SlidePayload::default()
                    },
                    SlidePayload {
                        kind: Some("section".to_string()),
                        title: Some("Approach".to_string()),
                        ..SlidePayload::default()
                    },
                ],
                ..DeckPayload::default()
            }),
            ..ValidationResult::default()
        }
    }

    fn scripted(oracle: ScriptedOracle) -> DeckPipeline<ScriptedOracle> {
        DeckPipeline::new(oracle).with_markup_date("01/01/2025")
    }

    #[tokio::test]
    async fn test_valid_short_circuits() {
        let pipeline = scripted(ScriptedOracle::new(vec![verdict(ValidationStatus::Valid)]))
            .with_max_iterations(5);
        let deck = pipeline.run(SOURCE, None).await.unwrap();

        assert_eq!(deck.iterations, 1);
        assert_eq!(pipeline.oracle().validations(), 1);
        assert_eq!(pipeline.oracle().generations(), 1);
        assert_eq!(deck.outcome, LoopOutcome::Accepted);
        assert_eq!(deck.final_status, ValidationStatus::Valid);
        assert_eq!(deck.presentation.slide_count(), 3);
        assert!(deck.markup.contains("data-slide-type=\"conclusion\""));
    }

    #[tokio::test]
    async fn test_bounded_by_max_iterations() {
        let pipeline = scripted(ScriptedOracle::always(correction("Fixed")));
        let deck = pipeline.run(SOURCE, None).await.unwrap();

        assert_eq!(pipeline.max_iterations(), DEFAULT_MAX_ITERATIONS);
        assert_eq!(deck.iterations, 3);
        assert_eq!(pipeline.oracle().validations(), 3);
        assert_eq!(deck.outcome, LoopOutcome::Accepted);
        assert_eq!(deck.final_status, ValidationStatus::Invalid);
        let numbers: Vec<usize> = deck.history.iter().map(|r| r.iteration).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let pipeline = scripted(ScriptedOracle::always(correction("Fixed"))).with_max_iterations(1);
        let deck = pipeline.run(SOURCE, None).await.unwrap();
        assert_eq!(deck.iterations, 1);
    }

    #[tokio::test]
    async fn test_zero_budget_still_validates_once() {
        let pipeline = scripted(ScriptedOracle::always(correction("Fixed"))).with_max_iterations(0);
        let deck = pipeline.run(SOURCE, None).await.unwrap();
        assert_eq!(deck.iterations, 1);
    }

    #[tokio::test]
    async fn test_correction_replaces_deck() {
        let pipeline = scripted(ScriptedOracle::new(vec![
            correction("Cloud, corrected"),
            verdict(ValidationStatus::Valid),
        ]));
        let deck = pipeline.run(SOURCE, None).await.unwrap();

        assert_eq!(deck.iterations, 2);
        assert_eq!(deck.outcome, LoopOutcome::Accepted);
        assert_eq!(deck.presentation.title, "Cloud, corrected");
        assert_eq!(
            deck.presentation.kinds(),
            vec![SlideKind::Title, SlideKind::Section]
        );
        // Corrections without key messages keep the generated ones.
        assert_eq!(deck.key_messages, vec!["Move fast"]);

        let seen = pipeline.oracle().seen_markup.lock().unwrap();
        assert!(seen[0].contains("Benefits"));
        assert!(seen[1].contains("Cloud, corrected"));
        assert!(!seen[1].contains("Benefits"));
        assert_eq!(deck.history[1].markup_length, seen[1].len());
        assert_eq!(deck.markup, seen[1].as_str());
    }

    #[tokio::test]
    async fn test_no_correction_stops_immediately() {
        let mut flagged = verdict(ValidationStatus::Invalid);
        flagged.needs_correction = true;
        flagged.content_issues = vec!["off topic".to_string()];

        let pipeline = scripted(ScriptedOracle::always(flagged));
        let deck = pipeline.run(SOURCE, None).await.unwrap();

        assert_eq!(deck.iterations, 1);
        assert_eq!(pipeline.oracle().validations(), 1);
        assert_eq!(deck.outcome, LoopOutcome::AcceptedWithWarning);
        assert_eq!(deck.final_status, ValidationStatus::Invalid);
        assert_eq!(deck.presentation.slide_count(), 3);
    }

    #[tokio::test]
    async fn test_warning_without_correction() {
        let mut warning = verdict(ValidationStatus::Warning);
        warning.suggestions = vec!["shorter titles".to_string()];

        let pipeline = scripted(ScriptedOracle::new(vec![warning]));
        let deck = pipeline.run(SOURCE, None).await.unwrap();

        assert_eq!(deck.iterations, 1);
        assert_eq!(deck.outcome, LoopOutcome::AcceptedWithWarning);
        assert_eq!(deck.final_status, ValidationStatus::Warning);
        assert_eq!(
            deck.last_validation().unwrap().suggestions,
            vec!["shorter titles"]
        );

        // A warning still yields a renderable deck.
        let dir = tempfile::tempdir().unwrap();
        let path = deck_pptx::DeckRenderer::new()
            .render_to_path(&deck.presentation, &dir.path().join("deck.pptx"))
            .unwrap();
        let extracted = deck_pptx::PptxReader::new().read_path(&path).unwrap();
        assert_eq!(extracted.slides.len(), 3);
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let pipeline = scripted(ScriptedOracle::failing_generation());
        let err = pipeline.run(SOURCE, None).await.unwrap_err();

        assert!(matches!(err, AgentError::MalformedResponse(_)));
        assert_eq!(pipeline.oracle().validations(), 0);
    }

    #[tokio::test]
    async fn test_short_input_rejected_before_calls() {
        let pipeline = scripted(ScriptedOracle::new(Vec::new()));
        let err = pipeline.run("/deck  hi", None).await.unwrap_err();

        assert!(err.is_input_error());
        assert_eq!(pipeline.oracle().generations(), 0);
        assert_eq!(pipeline.oracle().validations(), 0);
    }

    #[tokio::test]
    async fn test_call_timeout() {
        let mut oracle = ScriptedOracle::new(Vec::new());
        oracle.delay = Some(Duration::from_secs(5));
        let pipeline = scripted(oracle).with_call_timeout(Duration::from_millis(20));

        let err = pipeline.run(SOURCE, None).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_result_serializes() {
        let pipeline = scripted(ScriptedOracle::new(vec![verdict(ValidationStatus::Warning)]));
        let deck = pipeline.run(SOURCE, None).await.unwrap();
        let value = serde_json::to_value(&deck).unwrap();

        assert_eq!(value["outcome"], "accepted_with_warning");
        assert_eq!(value["final_status"], "warning");
        assert_eq!(value["history"][0]["validation"]["validation_status"], "warning");
        assert_eq!(value["presentation"]["slides"][1]["title"], "Benefits");
    }
}
