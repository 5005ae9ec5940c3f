//! Validator verdicts.

use deck_core::DeckPayload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall verdict of one validator call.
///
/// Anything other than `valid` or `invalid`, including a missing status, is
/// read as `warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    #[default]
    Warning,
}

impl From<String> for ValidationStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "valid" => ValidationStatus::Valid,
            "invalid" => ValidationStatus::Invalid,
            _ => ValidationStatus::Warning,
        }
    }
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Invalid => "invalid",
            ValidationStatus::Warning => "warning",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The validator's answer for one iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationResult {
    #[serde(rename = "validation_status")]
    pub status: ValidationStatus,

    /// Markup defects.
    pub html_errors: Vec<String>,

    /// Stylesheet defects.
    pub css_errors: Vec<String>,

    pub charter_violations: Vec<String>,

    /// Mismatches between the deck and the requested content.
    pub content_issues: Vec<String>,

    pub suggestions: Vec<String>,

    pub needs_correction: bool,

    /// Full replacement deck, when the validator offers one.
    #[serde(rename = "corrected_slides_data", skip_serializing_if = "Option::is_none")]
    pub corrected_payload: Option<DeckPayload>,
}

impl ValidationResult {
    /// Parse a validator response.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn valid() -> Self {
        Self {
            status: ValidationStatus::Valid,
            ..Self::default()
        }
    }

    /// The replacement deck, if this result asks for a correction and carries
    /// one with at least one slide.
    pub fn correction(&self) -> Option<&DeckPayload> {
        if !self.needs_correction {
            return None;
        }
        self.corrected_payload
            .as_ref()
            .filter(|payload| !payload.slides.is_empty())
    }

    /// Total number of reported problems across all categories.
    pub fn issue_count(&self) -> usize {
        self.html_errors.len()
            + self.css_errors.len()
            + self.charter_violations.len()
            + self.content_issues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let json = r#"{
            "validation_status": "invalid",
            "html_errors": ["unclosed div"],
            "css_errors": [],
            "charter_violations": ["pink title"],
            "content_issues": [],
            "suggestions": ["shorten slide 3"],
            "needs_correction": true,
            "corrected_slides_data": {
                "title": "Cloud",
                "slides": [{"type": "title", "title": "Cloud"}]
            }
        }"#;

        let result = ValidationResult::from_json(json).unwrap();
        assert_eq!(result.status, ValidationStatus::Invalid);
        assert_eq!(result.issue_count(), 2);
        assert_eq!(result.suggestions, vec!["shorten slide 3"]);
        let correction = result.correction().unwrap();
        assert_eq!(correction.slides.len(), 1);
    }

    #[test]
    fn test_unknown_and_missing_status() {
        let result = ValidationResult::from_json(r#"{"validation_status": "ok-ish"}"#).unwrap();
        assert_eq!(result.status, ValidationStatus::Warning);

        let result = ValidationResult::from_json(r#"{"needs_correction": false}"#).unwrap();
        assert_eq!(result.status, ValidationStatus::Warning);

        let result = ValidationResult::from_json(r#"{"validation_status": "VALID"}"#).unwrap();
        assert_eq!(result.status, ValidationStatus::Valid);
    }

    #[test]
    fn test_correction_requires_flag_and_slides() {
        let mut result = ValidationResult::from_json(
            r#"{"validation_status": "invalid", "corrected_slides_data": {"slides": [{"title": "A"}]}}"#,
        )
        .unwrap();
        assert!(result.correction().is_none());

        result.needs_correction = true;
        assert!(result.correction().is_some());

        let empty = ValidationResult::from_json(
            r#"{"needs_correction": true, "corrected_slides_data": {}}"#,
        )
        .unwrap();
        assert!(empty.correction().is_none());
    }

    #[test]
    fn test_serialize_wire_names() {
        let value = serde_json::to_value(ValidationResult::valid()).unwrap();
        assert_eq!(value["validation_status"], "valid");
        assert!(value.get("corrected_slides_data").is_none());
    }

    #[test]
    fn test_malformed_correction_is_an_error() {
        assert!(ValidationResult::from_json(r#"{"corrected_slides_data": "see above"}"#).is_err());
        assert!(ValidationResult::from_json("not json").is_err());
    }
}
