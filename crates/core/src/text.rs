//! Source text preparation.
//!
//! Normalizes user-supplied content before it is sent to the generator,
//! enforces the length bounds, and produces the short excerpts embedded in
//! validator requests.

use crate::error::{Error, Result};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Shortest accepted source by default, in characters after trimming.
pub const MIN_SOURCE_CHARS: usize = 10;

/// Longest source sent to the generator, in characters.
pub const MAX_SOURCE_CHARS: usize = 120_000;

/// Appended to a source that was cut at [`MAX_SOURCE_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Regex to collapse multiple whitespace characters into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

/// Regex to collapse runs of blank lines.
static BLANK_LINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Regex to match a leading chat command (`/deck`, `/rfp`, `/diagram`, ...).
static COMMAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*/(deck|presentation|slides|rfp|summary|diagram|schema)\b\s*").unwrap()
});

/// Source text normalizer.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Minimum number of characters accepted.
    min_chars: usize,
    /// Maximum number of characters kept.
    max_chars: usize,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self {
            min_chars: MIN_SOURCE_CHARS,
            max_chars: MAX_SOURCE_CHARS,
        }
    }
}

impl TextNormalizer {
    /// Create a normalizer with the default bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of characters kept.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(self.min_chars);
        self
    }

    /// Set the minimum number of characters accepted.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self.max_chars = self.max_chars.max(min_chars);
        self
    }

    /// Normalize raw source text.
    ///
    /// - Composes Unicode to NFC
    /// - Normalizes line endings to `\n`
    /// - Collapses runs of spaces and tabs on each line
    /// - Keeps at most one blank line between paragraphs
    /// - Trims leading/trailing whitespace
    pub fn normalize(&self, text: &str) -> String {
        let composed: String = text.nfc().collect();
        let unified = composed.replace("\r\n", "\n").replace('\r', "\n");

        let lines: Vec<String> = unified
            .lines()
            .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
            .collect();

        let joined = lines.join("\n");
        BLANK_LINES_REGEX.replace_all(&joined, "\n\n").trim().to_string()
    }

    /// Normalize and bound a source for the generator.
    ///
    /// A leading chat command is dropped. Rejects sources shorter than the
    /// configured minimum and truncates sources longer than the configured
    /// maximum, appending [`TRUNCATION_MARKER`].
    pub fn prepare(&self, text: &str) -> Result<String> {
        let normalized = self.normalize(strip_command(text));

        let length = normalized.chars().count();
        if length < self.min_chars {
            return Err(Error::InvalidInput(format!(
                "content is too short ({} characters, at least {} required)",
                length, self.min_chars
            )));
        }

        Ok(truncate_with_marker(&normalized, self.max_chars).into_owned())
    }
}

/// Remove a leading chat command such as `/deck` or `/rfp`.
pub fn strip_command(text: &str) -> &str {
    match COMMAND_REGEX.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Cut `text` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was removed.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

/// Short prefix of `text` for embedding in a prompt, suffixed with `...` when
/// cut.
pub fn excerpt(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}...", &text[..byte_idx])),
        None => Cow::Borrowed(text),
    }
}
