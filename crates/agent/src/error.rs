//! Error types for the generation and validation calls.

use thiserror::Error;

/// Result type alias using [`AgentError`].
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that abort a whole generation request.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The request never reached the model or the connection broke.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The model endpoint answered with a non-success status.
    #[error("Model endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    /// The model answered, but not with the expected structured payload.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// A single call exceeded its time budget.
    #[error("Model call timed out after {0} seconds")]
    Timeout(u64),

    /// Missing or inconsistent agent configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input, markup or storage failure from the deck crates.
    #[error(transparent)]
    Core(#[from] deck_core::Error),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        AgentError::Http(e.to_string())
    }
}

impl AgentError {
    /// Whether the failure was caused by the caller's input rather than by
    /// the model or the host.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AgentError::Core(deck_core::Error::InvalidInput(_))
                | AgentError::Core(deck_core::Error::UnsupportedFormat(_))
        )
    }
}
