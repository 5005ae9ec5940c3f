//! [`Presentation`] → markup document.
//!
//! The document is what the preview endpoint serves and what the parser reads
//! back before rendering, so every field the parser looks for is emitted with
//! the same tag and class, all text is entity-escaped, and void elements are
//! self-closed.

use crate::parser::META_SEPARATOR;
use deck_core::model::bullet_level;
use deck_core::{BrandPalette, Error, Presentation, Result, Slide, SlideBody, BRAND};
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;

/// Date format used in the header meta line and on the cover slide.
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Builds the markup document for a presentation.
#[derive(Debug, Clone)]
pub struct MarkupBuilder<'p> {
    palette: &'p BrandPalette,
    date: String,
}

impl Default for MarkupBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupBuilder<'static> {
    /// Builder using the brand palette and today's date.
    pub fn new() -> Self {
        Self {
            palette: &BRAND,
            date: chrono::Local::now().format(DATE_FORMAT).to_string(),
        }
    }
}

impl<'p> MarkupBuilder<'p> {
    /// Use a different palette.
    pub fn with_palette<'q>(self, palette: &'q BrandPalette) -> MarkupBuilder<'q> {
        MarkupBuilder {
            palette,
            date: self.date,
        }
    }

    /// Use a fixed date line instead of today.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Render the full document.
    pub fn build(&self, presentation: &Presentation) -> Result<String> {
        let mut out = String::with_capacity(4096 + presentation.slide_count() * 1024);
        self.write_document(&mut out, presentation)
            .map_err(|e| Error::XmlError(format!("Failed to write markup: {}", e)))?;
        Ok(out)
    }

    fn write_document(&self, out: &mut String, presentation: &Presentation) -> std::fmt::Result {
        let title = escape(&presentation.title);

        out.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n");
        out.push_str("<meta charset=\"UTF-8\"/>\n");
        out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\"/>\n");
        writeln!(out, "<title>{}</title>", title)?;
        out.push_str("<style>\n");
        self.write_stylesheet(out)?;
        out.push_str("</style>\n</head>\n<body>\n");

        out.push_str("<div class=\"presentation-header\">\n");
        writeln!(out, "<h1>{}</h1>", title)?;
        writeln!(
            out,
            "<div class=\"meta\">{} {} {}</div>",
            escape(&presentation.subtitle),
            META_SEPARATOR,
            escape(&self.date)
        )?;
        out.push_str("</div>\n");

        out.push_str("<div class=\"slides\">\n");
        let total = presentation.slide_count();
        for (idx, slide) in presentation.slides.iter().enumerate() {
            self.write_slide(out, slide, idx, total)?;
        }
        out.push_str("</div>\n</body>\n</html>\n");
        Ok(())
    }

    fn write_slide(&self, out: &mut String, slide: &Slide, idx: usize, total: usize) -> std::fmt::Result {
        let kind = slide.kind();
        writeln!(
            out,
            "<div class=\"slide type-{kind}\" data-slide-type=\"{kind}\" data-slide-index=\"{idx}\" data-notes=\"{notes}\">",
            kind = kind,
            idx = idx,
            notes = escape(&slide.notes)
        )?;

        let title = escape(&slide.title);
        match &slide.body {
            SlideBody::Title { subtitle, date } => {
                writeln!(out, "<h1 class=\"slide-title\">{}</h1>", title)?;
                if !subtitle.is_empty() {
                    writeln!(out, "<p class=\"slide-subtitle\">{}</p>", escape(subtitle))?;
                }
                writeln!(out, "<p class=\"slide-author\">{}</p>", escape(self.palette.wordmark))?;
                let date = date.as_deref().unwrap_or(&self.date);
                writeln!(out, "<p class=\"slide-date\">{}</p>", escape(date))?;
            }
            SlideBody::Section => {
                writeln!(out, "<h2 class=\"slide-title\">{}</h2>", title)?;
            }
            SlideBody::Content { subtitle, bullets } => {
                writeln!(out, "<h2 class=\"slide-title\">{}</h2>", title)?;
                if !subtitle.is_empty() {
                    writeln!(out, "<p class=\"slide-subtitle\">{}</p>", escape(subtitle))?;
                }
                out.push_str("<div class=\"slide-content\">\n");
                write_bullet_list(out, bullets)?;
                out.push_str("</div>\n");
            }
            SlideBody::Comparison { left, right } => {
                writeln!(out, "<h2 class=\"slide-title\">{}</h2>", title)?;
                out.push_str("<div class=\"comparison-container\">\n");
                for column in [left, right] {
                    write_comparison_column(out, column)?;
                }
                out.push_str("</div>\n");
            }
            SlideBody::Conclusion { bullets } => {
                writeln!(out, "<h2 class=\"slide-title\">{}</h2>", title)?;
                out.push_str("<div class=\"slide-content\">\n");
                for bullet in bullets {
                    writeln!(out, "<p>{}</p>", escape(bullet.trim()))?;
                }
                out.push_str("</div>\n");
                writeln!(out, "<div class=\"contact-info\">{}</div>", escape(self.palette.contact_line))?;
            }
        }

        writeln!(
            out,
            "<div class=\"slide-footer\"><span class=\"brand\">{}</span><span class=\"slide-number\">{} / {}</span></div>",
            escape(self.palette.wordmark),
            idx + 1,
            total
        )?;
        out.push_str("</div>\n");
        Ok(())
    }

    fn write_stylesheet(&self, out: &mut String) -> std::fmt::Result {
        let p = self.palette;
        writeln!(
            out,
            ":root {{ --primary: {}; --secondary: {}; --accent: {}; --dark: {}; --text: {}; --text-light: {}; --background: {}; --light-gray: {}; --font-title: '{}'; --font-body: '{}'; --font-caption: '{}'; }}",
            p.primary.css(),
            p.secondary.css(),
            p.accent.css(),
            p.dark.css(),
            p.text.css(),
            p.text_light.css(),
            p.background.css(),
            p.light_gray.css(),
            p.title_font,
            p.body_font,
            p.caption_font
        )?;
        out.push_str(STYLESHEET_RULES);
        Ok(())
    }
}

/// Static rules; every color and typeface goes through the custom properties.
const STYLESHEET_RULES: &str = "\
body { margin: 0; padding: 24px; background: var(--light-gray); font-family: var(--font-body), sans-serif; color: var(--text); }
.presentation-header { max-width: 960px; margin: 0 auto 24px; }
.presentation-header h1 { font-family: var(--font-title), sans-serif; color: var(--primary); margin: 0; }
.presentation-header .meta { font-family: var(--font-caption), sans-serif; color: var(--text-light); }
.slide { position: relative; width: 960px; height: 540px; margin: 0 auto 24px; padding: 48px; box-sizing: border-box; background: var(--background); overflow: hidden; }
.slide::before { content: ''; position: absolute; top: 0; left: 0; right: 0; height: 8px; background: linear-gradient(90deg, var(--primary), var(--secondary), var(--accent)); }
.slide-title { font-family: var(--font-title), sans-serif; color: var(--primary); margin: 0 0 12px; }
.slide-subtitle { font-family: var(--font-caption), sans-serif; font-style: italic; color: var(--dark); }
.slide-content ul { font-size: 20px; line-height: 1.5; }
.slide-content ul ul { font-size: 16px; }
.type-title { background: var(--primary); text-align: center; }
.type-title .slide-title, .type-title .slide-subtitle, .type-title .slide-author { color: #FFFFFF; }
.type-title .slide-title { font-size: 54px; margin-top: 140px; }
.type-title .slide-date { color: var(--light-gray); }
.type-section { background: var(--secondary); display: flex; align-items: center; justify-content: center; }
.type-section .slide-title { color: #FFFFFF; font-size: 48px; }
.type-conclusion { background: var(--dark); text-align: center; color: #FFFFFF; }
.type-conclusion .slide-title { color: #FFFFFF; font-size: 48px; }
.comparison-container { display: flex; gap: 24px; }
.comparison-column { flex: 1; background: var(--light-gray); border-top: 4px solid var(--accent); padding: 16px; }
.contact-info { position: absolute; bottom: 60px; left: 0; right: 0; font-family: var(--font-caption), sans-serif; }
.slide-footer { position: absolute; bottom: 12px; left: 48px; right: 48px; display: flex; flex-direction: row-reverse; justify-content: space-between; font-size: 11px; }
.slide-footer .brand { font-family: var(--font-title), sans-serif; font-weight: bold; color: var(--primary); }
.slide-footer .slide-number { color: var(--text-light); }
";

/// Top-level bullets as `<li>`; nested bullets go in a `<ul>` under the
/// preceding item.
fn write_bullet_list(out: &mut String, bullets: &[String]) -> std::fmt::Result {
    out.push_str("<ul>\n");
    let mut item_open = false;
    let mut nested_open = false;

    for bullet in bullets {
        let (level, text) = bullet_level(bullet);
        if level > 0 && !item_open {
            // Nested entry with no parent: hang it under an empty item
            out.push_str("<li>");
            item_open = true;
        }
        if level > 0 {
            if !nested_open {
                out.push_str("<ul>");
                nested_open = true;
            }
            writeln!(out, "<li>{}</li>", escape(text))?;
            continue;
        }

        close_item(out, &mut item_open, &mut nested_open);
        write!(out, "<li>{}", escape(text))?;
        item_open = true;
    }

    close_item(out, &mut item_open, &mut nested_open);
    out.push_str("</ul>\n");
    Ok(())
}

fn close_item(out: &mut String, item_open: &mut bool, nested_open: &mut bool) {
    if *nested_open {
        out.push_str("</ul>");
        *nested_open = false;
    }
    if *item_open {
        out.push_str("</li>\n");
        *item_open = false;
    }
}

/// A leading `**Heading**` entry becomes the column's `<h3>`.
fn write_comparison_column(out: &mut String, items: &[String]) -> std::fmt::Result {
    out.push_str("<div class=\"comparison-column\">\n");

    let mut rest = items;
    if let Some((first, tail)) = items.split_first() {
        if let Some(heading) = column_heading(first) {
            writeln!(out, "<h3>{}</h3>", escape(heading))?;
            rest = tail;
        }
    }

    write_bullet_list(out, rest)?;
    out.push_str("</div>\n");
    Ok(())
}

fn column_heading(item: &str) -> Option<&str> {
    item.strip_prefix("**")
        .and_then(|s| s.strip_suffix("**"))
        .filter(|s| !s.trim().is_empty())
}
