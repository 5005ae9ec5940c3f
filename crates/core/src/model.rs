//! Structural model of a generated presentation.
//!
//! A [`Presentation`] is an ordered list of [`Slide`]s. Each slide carries the
//! fields shared by every layout (title, notes) and a [`SlideBody`] holding only
//! what its layout actually uses, so a comparison slide cannot carry a flat
//! bullet list and a section divider cannot carry bullets at all.
//!
//! Slide order is display order and is never changed by any stage of the
//! pipeline.

use serde::{Deserialize, Serialize};

/// Prefix that marks a bullet as coming from a nested list.
///
/// Nested entries are flattened into the bullet sequence during parsing; the
/// prefix lets the renderer draw them indented and at a reduced size. It is
/// not whitespace, so stray indentation in generated bullets never reads as
/// nesting.
pub const NESTED_BULLET_PREFIX: &str = "↳ ";

/// A whole presentation, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "crate::payload::DeckPayload", into = "crate::payload::DeckPayload")]
pub struct Presentation {
    /// Deck title (may be empty).
    pub title: String,

    /// Deck subtitle (may be empty).
    pub subtitle: String,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create an empty presentation with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: String::new(),
            slides: Vec::new(),
        }
    }

    /// Set the subtitle.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    /// Append a slide at the end of the deck.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Layout kinds in display order.
    pub fn kinds(&self) -> Vec<SlideKind> {
        self.slides.iter().map(Slide::kind).collect()
    }
}

/// Layout kind of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    /// Cover slide.
    Title,
    /// Structural divider between parts.
    Section,
    /// Standard title + bullets slide.
    Content,
    /// Two-column comparison.
    Comparison,
    /// Closing statements.
    Conclusion,
}

impl SlideKind {
    /// Resolve a kind from its wire name.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace. Missing
    /// or unrecognized names fall back to [`SlideKind::Content`].
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_lowercase()).as_deref() {
            Some("title") => Self::Title,
            Some("section") => Self::Section,
            Some("comparison") => Self::Comparison,
            Some("conclusion") => Self::Conclusion,
            _ => Self::Content,
        }
    }

    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Section => "section",
            Self::Content => "content",
            Self::Comparison => "comparison",
            Self::Conclusion => "conclusion",
        }
    }
}

impl std::fmt::Display for SlideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// Slide headline (may be empty).
    pub title: String,

    /// Speaker / visual-suggestion notes. Carried through, never drawn.
    pub notes: String,

    /// Layout-specific content.
    pub body: SlideBody,
}

/// Layout-specific slide content.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideBody {
    /// Cover slide: headline, subtitle and an optional date line.
    Title {
        subtitle: String,
        date: Option<String>,
    },

    /// Divider: headline only.
    Section,

    /// Headline, optional subtitle and a bullet list.
    Content {
        subtitle: String,
        bullets: Vec<String>,
    },

    /// Two independent bullet columns.
    Comparison {
        left: Vec<String>,
        right: Vec<String>,
    },

    /// Closing statements.
    Conclusion { bullets: Vec<String> },
}

impl Slide {
    /// Cover slide.
    pub fn title(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self::with_body(
            title,
            SlideBody::Title {
                subtitle: subtitle.into(),
                date: None,
            },
        )
    }

    /// Section divider.
    pub fn section(title: impl Into<String>) -> Self {
        Self::with_body(title, SlideBody::Section)
    }

    /// Standard content slide.
    pub fn content<I, S>(title: impl Into<String>, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_body(
            title,
            SlideBody::Content {
                subtitle: String::new(),
                bullets: bullets.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Comparison slide whose columns are derived by bisecting a flat list.
    pub fn comparison<I, S>(title: impl Into<String>, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bullets: Vec<String> = bullets.into_iter().map(Into::into).collect();
        let (left, right) = bisect(bullets);
        Self::with_body(title, SlideBody::Comparison { left, right })
    }

    /// Comparison slide with explicit columns.
    pub fn comparison_columns(
        title: impl Into<String>,
        left: Vec<String>,
        right: Vec<String>,
    ) -> Self {
        Self::with_body(title, SlideBody::Comparison { left, right })
    }

    /// Closing slide.
    pub fn conclusion<I, S>(title: impl Into<String>, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_body(
            title,
            SlideBody::Conclusion {
                bullets: bullets.into_iter().map(Into::into).collect(),
            },
        )
    }

    fn with_body(title: impl Into<String>, body: SlideBody) -> Self {
        Self {
            title: title.into(),
            notes: String::new(),
            body,
        }
    }

    /// Attach notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Set the subtitle on layouts that have one. Ignored elsewhere.
    pub fn with_subtitle(mut self, value: impl Into<String>) -> Self {
        match &mut self.body {
            SlideBody::Title { subtitle, .. } | SlideBody::Content { subtitle, .. } => {
                *subtitle = value.into();
            }
            _ => {}
        }
        self
    }

    /// Set the date line of a cover slide. Ignored elsewhere.
    pub fn with_date(mut self, value: impl Into<String>) -> Self {
        if let SlideBody::Title { date, .. } = &mut self.body {
            *date = Some(value.into());
        }
        self
    }

    /// Layout kind.
    pub fn kind(&self) -> SlideKind {
        match self.body {
            SlideBody::Title { .. } => SlideKind::Title,
            SlideBody::Section => SlideKind::Section,
            SlideBody::Content { .. } => SlideKind::Content,
            SlideBody::Comparison { .. } => SlideKind::Comparison,
            SlideBody::Conclusion { .. } => SlideKind::Conclusion,
        }
    }

    /// Subtitle, empty for layouts without one.
    pub fn subtitle(&self) -> &str {
        match &self.body {
            SlideBody::Title { subtitle, .. } | SlideBody::Content { subtitle, .. } => subtitle,
            _ => "",
        }
    }

    /// All bullet text in display order. Comparison columns are concatenated
    /// left then right.
    pub fn bullets(&self) -> Vec<&str> {
        match &self.body {
            SlideBody::Content { bullets, .. } | SlideBody::Conclusion { bullets } => {
                bullets.iter().map(String::as_str).collect()
            }
            SlideBody::Comparison { left, right } => {
                left.iter().chain(right.iter()).map(String::as_str).collect()
            }
            SlideBody::Title { .. } | SlideBody::Section => Vec::new(),
        }
    }
}

/// Split a flat list into two columns at its midpoint.
///
/// The left column receives `floor(len / 2)` items and the right column the
/// rest, both in original order.
pub fn bisect(mut items: Vec<String>) -> (Vec<String>, Vec<String>) {
    let right = items.split_off(items.len() / 2);
    (items, right)
}

/// Split a bullet into its nesting level and display text.
///
/// Returns `(1, text)` for entries carrying [`NESTED_BULLET_PREFIX`] and
/// `(0, text)` otherwise. The text is trimmed either way.
pub fn bullet_level(bullet: &str) -> (u8, &str) {
    let bullet = bullet.trim_start();
    match bullet.strip_prefix(NESTED_BULLET_PREFIX) {
        Some(rest) => (1, rest.trim()),
        None => (0, bullet.trim_end()),
    }
}

/// Canonical form of a bullet arriving from outside: surrounding whitespace
/// removed, nesting marker kept.
pub fn clean_bullet(bullet: &str) -> String {
    match bullet_level(bullet) {
        (0, text) => text.to_string(),
        (_, text) => nested_bullet(text),
    }
}

/// Mark a bullet as nested.
pub fn nested_bullet(text: &str) -> String {
    format!("{}{}", NESTED_BULLET_PREFIX, text.trim())
}
