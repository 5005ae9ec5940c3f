//! Wire representation of a deck, as exchanged with the generator and the
//! validator.
//!
//! The payload is loosely typed on purpose: every field is optional and slide
//! kinds are free-form strings. Conversion into the [`Presentation`] model is
//! where the fallback rules are applied (unknown kind → content, missing field
//! → empty, missing comparison columns → bisected bullets).

use crate::model::{bisect, clean_bullet, Presentation, Slide, SlideBody, SlideKind};
use serde::{Deserialize, Serialize};

/// A whole deck on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    pub slides: Vec<SlidePayload>,

    /// Headline messages the generator wants the deck to land.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_messages: Vec<String>,
}

/// One slide on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidePayload {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_bullets: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_bullets: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DeckPayload {
    /// Parse a payload from a JSON document.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert into the structural model, keeping the key messages aside.
    pub fn into_parts(self) -> (Presentation, Vec<String>) {
        let key_messages = self.key_messages.clone();
        (Presentation::from(self), key_messages)
    }
}

impl From<DeckPayload> for Presentation {
    fn from(payload: DeckPayload) -> Self {
        Presentation {
            title: payload.title.unwrap_or_default(),
            subtitle: payload.subtitle.unwrap_or_default(),
            slides: payload.slides.into_iter().map(Slide::from).collect(),
        }
    }
}

impl From<SlidePayload> for Slide {
    fn from(payload: SlidePayload) -> Self {
        let kind = SlideKind::from_name(payload.kind.as_deref());
        let subtitle = payload.subtitle.unwrap_or_default();
        let bullets = clean_bullets(payload.bullets);

        let body = match kind {
            SlideKind::Title => SlideBody::Title {
                subtitle,
                date: payload.date.filter(|d| !d.trim().is_empty()),
            },
            SlideKind::Section => SlideBody::Section,
            SlideKind::Content => SlideBody::Content { subtitle, bullets },
            SlideKind::Comparison => {
                let left = clean_bullets(payload.left_bullets);
                let right = clean_bullets(payload.right_bullets);
                if left.is_empty() && right.is_empty() {
                    let (left, right) = bisect(bullets);
                    SlideBody::Comparison { left, right }
                } else {
                    SlideBody::Comparison { left, right }
                }
            }
            SlideKind::Conclusion => SlideBody::Conclusion { bullets },
        };

        Slide {
            title: payload.title.unwrap_or_default(),
            notes: payload.notes.unwrap_or_default(),
            body,
        }
    }
}

fn clean_bullets(bullets: Option<Vec<String>>) -> Vec<String> {
    bullets
        .unwrap_or_default()
        .iter()
        .map(|b| clean_bullet(b))
        .collect()
}

impl From<Presentation> for DeckPayload {
    fn from(presentation: Presentation) -> Self {
        DeckPayload {
            title: Some(presentation.title),
            subtitle: Some(presentation.subtitle),
            slides: presentation.slides.into_iter().map(SlidePayload::from).collect(),
            key_messages: Vec::new(),
        }
    }
}

impl From<Slide> for SlidePayload {
    fn from(slide: Slide) -> Self {
        let mut payload = SlidePayload {
            kind: Some(slide.kind().as_str().to_string()),
            title: Some(slide.title),
            notes: Some(slide.notes).filter(|n| !n.is_empty()),
            ..SlidePayload::default()
        };

        match slide.body {
            SlideBody::Title { subtitle, date } => {
                payload.subtitle = Some(subtitle).filter(|s| !s.is_empty());
                payload.date = date;
            }
            SlideBody::Section => {}
            SlideBody::Content { subtitle, bullets } => {
                payload.subtitle = Some(subtitle).filter(|s| !s.is_empty());
                payload.bullets = Some(bullets);
            }
            SlideBody::Comparison { left, right } => {
                payload.bullets = Some(left.iter().chain(right.iter()).cloned().collect());
                payload.left_bullets = Some(left);
                payload.right_bullets = Some(right);
            }
            SlideBody::Conclusion { bullets } => {
                payload.bullets = Some(bullets);
            }
        }

        payload
    }
}
