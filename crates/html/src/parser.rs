//! Markup document → [`Presentation`].
//!
//! The parser is an information-recovery pass: every lookup either finds its
//! element or leaves the corresponding field empty. Nothing here returns an
//! error.

use crate::dom::{Document, Element};
use deck_core::model::{bisect, nested_bullet};
use deck_core::{Presentation, Slide, SlideKind};

/// Tags that hold nested lists.
const LIST_TAGS: &[&str] = &["ul", "ol"];

/// Separator between subtitle and date in the header's meta line.
pub(crate) const META_SEPARATOR: char = '•';

/// Parser for the slide markup document.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupParser;

impl MarkupParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a markup document into a presentation. Never fails.
    pub fn parse(&self, markup: &str) -> Presentation {
        let doc = Document::parse(markup);

        let mut presentation = Presentation::new(self.deck_title(&doc)).with_subtitle(deck_subtitle(&doc));

        for block in doc.find_all(|e| e.is(&["div"], "slide")) {
            presentation.add_slide(self.parse_slide(&block));
        }

        log::debug!(
            "Parsed markup: {} slide(s), title {:?}",
            presentation.slide_count(),
            presentation.title
        );

        presentation
    }

    /// Header `<h1>` wins over the document `<title>`.
    fn deck_title(&self, doc: &Document) -> String {
        let header_title = doc
            .find(|e| e.is(&["div"], "presentation-header"))
            .and_then(|header| header.find(|e| e.name() == "h1"))
            .map(|h1| h1.text())
            .filter(|t| !t.is_empty());

        header_title
            .or_else(|| doc.find(|e| e.name() == "title").map(|t| t.text()))
            .unwrap_or_default()
    }

    fn parse_slide(&self, block: &Element<'_>) -> Slide {
        let kind = SlideKind::from_name(block.attr("data-slide-type"));
        let notes = block.attr("data-notes").unwrap_or_default().trim().to_string();

        let title = block
            .find(|e| e.is(&["h1", "h2"], "slide-title"))
            .map(|e| e.text())
            .unwrap_or_default();
        let subtitle = block
            .find(|e| e.is(&["p", "div"], "slide-subtitle"))
            .map(|e| e.text())
            .unwrap_or_default();
        let content = block.find(|e| e.is(&["div"], "slide-content"));

        let slide = match kind {
            SlideKind::Title => {
                let mut slide = Slide::title(title, subtitle);
                if let Some(date) = block
                    .find(|e| e.is(&["p"], "slide-date"))
                    .map(|e| e.text())
                    .filter(|d| !d.is_empty())
                {
                    slide = slide.with_date(date);
                }
                slide
            }
            SlideKind::Section => Slide::section(title),
            SlideKind::Content => {
                Slide::content(title, content.map(|c| list_bullets(&c)).unwrap_or_default())
                    .with_subtitle(subtitle)
            }
            SlideKind::Comparison => match block.find(|e| e.is(&["div"], "comparison-container")) {
                Some(container) => {
                    let (left, right) = comparison_columns(&container);
                    Slide::comparison_columns(title, left, right)
                }
                // No column container: split the generic list instead
                None => {
                    let bullets = content.map(|c| list_bullets(&c)).unwrap_or_default();
                    let (left, right) = bisect(bullets);
                    Slide::comparison_columns(title, left, right)
                }
            },
            SlideKind::Conclusion => Slide::conclusion(
                title,
                content
                    .map(|c| {
                        c.find_all(|e| e.name() == "p")
                            .iter()
                            .map(|p| p.text())
                            .filter(|t| !t.is_empty())
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default(),
            ),
        };

        slide.with_notes(notes)
    }
}

/// Subtitle is the part of the header meta line before the first separator.
fn deck_subtitle(doc: &Document) -> String {
    doc.find(|e| e.is(&["div"], "meta"))
        .map(|meta| {
            meta.text()
                .split(META_SEPARATOR)
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .unwrap_or_default()
}

/// Top-level items of the first list in `container`, each followed by its
/// nested items marked with the nested-bullet prefix.
fn list_bullets(container: &Element<'_>) -> Vec<String> {
    let Some(list) = container.find(|e| LIST_TAGS.contains(&e.name())) else {
        return Vec::new();
    };

    let mut bullets = Vec::new();
    for item in list.children().into_iter().filter(|e| e.name() == "li") {
        // An item holding only a sub-list contributes just the nested entries
        let text = item.text_excluding(LIST_TAGS);
        if !text.is_empty() {
            bullets.push(text);
        }

        if let Some(sub_list) = item.find(|e| LIST_TAGS.contains(&e.name())) {
            bullets.extend(
                sub_list
                    .find_all(|e| e.name() == "li")
                    .iter()
                    .map(|li| li.text_excluding(LIST_TAGS))
                    .filter(|t| !t.is_empty())
                    .map(|t| nested_bullet(&t)),
            );
        }
    }
    bullets
}

/// First column on the left, every further column on the right. A column
/// heading becomes a bolded marker entry ahead of its items, and nested items
/// keep their nesting mark.
fn comparison_columns(container: &Element<'_>) -> (Vec<String>, Vec<String>) {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for (idx, column) in container
        .find_all(|e| e.is(&["div"], "comparison-column"))
        .iter()
        .enumerate()
    {
        let target = if idx == 0 { &mut left } else { &mut right };

        if let Some(heading) = column.find(|e| e.name() == "h3").map(|h| h.text()) {
            if !heading.is_empty() {
                target.push(format!("**{}**", heading));
            }
        }
        target.extend(list_bullets(column));
    }

    (left, right)
}
