//! Error types for deck generation and rendering.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing, storing, parsing or rendering a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// File-system failure. Propagated as-is from the underlying call.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The source file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Source content was rejected before any external call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored artifact (scratch markup, rendered deck) does not exist.
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML generation or parsing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// Structured payload could not be encoded or decoded.
    #[error("Payload error: {0}")]
    PayloadError(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::PayloadError(e.to_string())
    }
}
