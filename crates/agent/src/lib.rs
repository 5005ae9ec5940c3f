//! Generation and validation of slide decks through an external chat model.
//!
//! [`DeckPipeline`] drives one generator call followed by a bounded number of
//! validator calls, applying any correction the validator offers in between.
//! The model itself sits behind the [`ChatModel`] trait; [`DeckOracle`] is the
//! seam tests replace with a scripted implementation.
//!
//! The same model also backs two single-call tools: [`RfpSummarizer`] for
//! tender documents and [`DiagramGenerator`] for editable diagrams.

pub mod client;
pub mod config;
pub mod diagram;
pub mod error;
pub mod oracle;
pub mod pipeline;
pub mod prompts;
pub mod rfp;
#[cfg(test)]
mod testing;
pub mod validation;

pub use client::{ChatMessage, ChatModel, ChatRequest, OpenAiChatModel};
pub use config::{AgentConfig, Provider};
pub use diagram::DiagramGenerator;
pub use error::{AgentError, Result};
pub use oracle::{DeckOracle, GeneratedDeck, LlmOracle};
pub use pipeline::{DeckPipeline, IterationRecord, LoopOutcome, ValidatedDeck};
pub use rfp::{RfpSummarizer, RfpSummary, Urgency};
pub use validation::{ValidationResult, ValidationStatus};
