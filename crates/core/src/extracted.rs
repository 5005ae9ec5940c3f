//! Types for content read back from an existing PPTX file.

use serde::{Deserialize, Serialize};

/// A deck read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedDeck {
    /// Original filename (without path).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<ExtractedSlide>,
}

impl ExtractedDeck {
    /// Create an empty deck for the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: ExtractedSlide) {
        self.slides.push(slide);
    }

    /// Plain text of the whole deck: one line per text block, slides
    /// separated by a blank line.
    pub fn plain_text(&self) -> String {
        self.slides
            .iter()
            .map(|s| s.non_empty_lines().join("\n"))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A single slide read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Text blocks on this slide, in reading order.
    pub lines: Vec<SlideText>,

    /// Solid background color (`RRGGBB`) when the slide declares one.
    pub background: Option<String>,
}

impl ExtractedSlide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            lines: Vec::new(),
            background: None,
        }
    }

    /// Add a text block with position information.
    pub fn add_line_with_position(&mut self, text: impl Into<String>, y: f64, x: f64) {
        self.lines.push(SlideText::with_position(text, y, x));
    }

    /// Sort text blocks by position (top-to-bottom, then left-to-right).
    pub fn sort_by_position(&mut self) {
        self.lines.sort_by(|a, b| {
            let y_cmp = a
                .y_position
                .partial_cmp(&b.y_position)
                .unwrap_or(std::cmp::Ordering::Equal);
            if y_cmp == std::cmp::Ordering::Equal {
                a.x_position
                    .partial_cmp(&b.x_position)
                    .unwrap_or(std::cmp::Ordering::Equal)
            } else {
                y_cmp
            }
        });
    }

    /// Get non-empty text blocks.
    pub fn non_empty_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }

    /// Whether any text block contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }
}

/// Text content from a shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideText {
    /// The text, paragraphs separated by `\n`.
    pub text: String,

    /// Y position in EMU. None if unknown.
    pub y_position: Option<f64>,

    /// X position in EMU. None if unknown.
    pub x_position: Option<f64>,
}

impl SlideText {
    /// Create new slide text with position info.
    pub fn with_position(text: impl Into<String>, y: f64, x: f64) -> Self {
        Self {
            text: text.into(),
            y_position: Some(y),
            x_position: Some(x),
        }
    }
}
