//! Structural model → editable PPTX file.
//!
//! Each slide kind has its own builder, a pure function of the slide and the
//! palette that returns a [`SlideDrawing`]. The shared chrome (top band,
//! wordmark, position indicator) is added afterwards by a single pass, so no
//! builder ever draws it.

use crate::package;
use crate::shape::{
    Align, Anchor, Fill, Outline, Paragraph, Rect, Shape, TextFrame, TextStyle,
};
use deck_core::model::bullet_level;
use crate::shape::Connector;
use deck_core::{BrandPalette, Presentation, Result, Rgb, Slide, SlideBody, BRAND, WHITE};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

/// Bullet glyphs per nesting level.
const BULLET: char = '•';
const NESTED_BULLET: char = '–';

/// Point size reduction applied to nested bullets.
const NESTED_SIZE_STEP: f64 = 4.0;

/// What a single slide looks like before serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDrawing {
    /// Full-bleed background color.
    pub background: Rgb,
    /// Shapes in z-order (first is bottom-most).
    pub shapes: Vec<Shape>,
    /// Connectors, drawn above every shape.
    pub connectors: Vec<Connector>,
}

impl SlideDrawing {
    pub(crate) fn new(background: Rgb) -> Self {
        Self {
            background,
            shapes: Vec::new(),
            connectors: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Shape by name.
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.name == name)
    }

    /// Serialize as a slide part.
    pub fn to_xml(&self) -> std::result::Result<String, std::fmt::Error> {
        let mut xml = String::with_capacity(2048 + self.shapes.len() * 1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&package::presentation_root("sld", ""));
        xml.push_str("<p:cSld>");
        xml.push_str("<p:bg><p:bgPr>");
        crate::shape::write_solid_fill(&mut xml, self.background)?;
        xml.push_str("<a:effectLst/></p:bgPr></p:bg>");
        xml.push_str("<p:spTree>");
        xml.push_str(package::SP_TREE_HEADER);
        // id 1 belongs to the group shape
        let mut id = 2;
        for shape in &self.shapes {
            shape.to_xml(id, &mut xml)?;
            id += 1;
        }
        for connector in &self.connectors {
            connector.to_xml(id, &mut xml)?;
            id += 1;
        }
        xml.push_str("</p:spTree>");
        xml.push_str("</p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        Ok(xml)
    }
}

/// Renders presentations into PPTX packages.
#[derive(Debug, Clone, Copy)]
pub struct DeckRenderer<'p> {
    palette: &'p BrandPalette,
}

impl Default for DeckRenderer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckRenderer<'static> {
    /// Renderer using the brand palette.
    pub fn new() -> Self {
        Self { palette: &BRAND }
    }
}

impl<'p> DeckRenderer<'p> {
    /// Renderer using a different palette.
    pub fn with_palette(palette: &'p BrandPalette) -> Self {
        Self { palette }
    }

    /// Draw every slide, chrome included, in presentation order.
    pub fn draw(&self, presentation: &Presentation) -> Vec<SlideDrawing> {
        let total = presentation.slide_count();
        presentation
            .slides
            .iter()
            .enumerate()
            .map(|(idx, slide)| {
                let mut drawing = self.layout(slide);
                self.apply_chrome(&mut drawing, idx + 1, total);
                drawing
            })
            .collect()
    }

    /// Layout of one slide without chrome.
    pub fn layout(&self, slide: &Slide) -> SlideDrawing {
        match &slide.body {
            SlideBody::Title { subtitle, date } => {
                title_slide(self.palette, &slide.title, subtitle, date.as_deref())
            }
            SlideBody::Section => section_slide(self.palette, &slide.title),
            SlideBody::Content { subtitle, bullets } => {
                content_slide(self.palette, &slide.title, subtitle, bullets)
            }
            SlideBody::Comparison { left, right } => {
                comparison_slide(self.palette, &slide.title, left, right)
            }
            SlideBody::Conclusion { bullets } => conclusion_slide(self.palette, &slide.title, bullets),
        }
    }

    /// Shared chrome: gradient band on top, wordmark bottom-right, and the
    /// 1-based `position / total` indicator bottom-left.
    pub fn apply_chrome(&self, drawing: &mut SlideDrawing, position: usize, total: usize) {
        let p = self.palette;

        drawing.push(Shape::rectangle(
            "Header Band",
            Rect::inches(0.0, 0.0, 10.0, 0.08),
            Fill::Linear {
                stops: vec![p.primary, p.secondary, p.accent],
                angle: 0.0,
            },
        ));

        drawing.push(Shape::text_box(
            "Wordmark",
            Rect::inches(8.5, 5.2, 1.2, 0.3),
            TextFrame::single(
                Paragraph::new(p.wordmark, TextStyle::new(p.title_font, 11.0, p.primary).bold())
                    .aligned(Align::Right),
            ),
        ));

        drawing.push(Shape::text_box(
            "Slide Number",
            Rect::inches(0.5, 5.2, 1.0, 0.3),
            TextFrame::single(Paragraph::new(
                format!("{} / {}", position, total),
                TextStyle::new(p.caption_font, 11.0, p.text_light),
            )),
        ));
    }

    /// Write the whole package to `writer` and return it.
    pub fn write<W: Write + Seek>(&self, presentation: &Presentation, writer: W) -> Result<W> {
        package::write_package(&self.draw(presentation), &presentation.title, self.palette, writer)
    }

    /// Render to `path`. The file appears only once it is completely written.
    pub fn render_to_path(&self, presentation: &Presentation, path: &Path) -> Result<PathBuf> {
        package::persist(path, |file| self.write(presentation, file).map(drop))?;
        log::info!(
            "Rendered {} slide(s) to {}",
            presentation.slide_count(),
            path.display()
        );
        Ok(path.to_path_buf())
    }
}

fn title_slide(p: &BrandPalette, title: &str, subtitle: &str, date: Option<&str>) -> SlideDrawing {
    let mut drawing = SlideDrawing::new(p.primary);

    drawing.push(Shape::text_box(
        "Title",
        Rect::inches(1.0, 2.0, 8.0, 1.0),
        TextFrame::single(
            Paragraph::new(title, TextStyle::new(p.title_font, 54.0, WHITE).bold()).aligned(Align::Center),
        ),
    ));

    if !subtitle.is_empty() {
        drawing.push(Shape::text_box(
            "Subtitle",
            Rect::inches(1.5, 3.2, 7.0, 0.6),
            TextFrame::single(
                Paragraph::new(subtitle, TextStyle::new(p.caption_font, 24.0, WHITE)).aligned(Align::Center),
            ),
        ));
    }

    if let Some(date) = date.filter(|d| !d.is_empty()) {
        drawing.push(Shape::text_box(
            "Date",
            Rect::inches(3.0, 4.5, 4.0, 0.4),
            TextFrame::single(
                Paragraph::new(date, TextStyle::new(p.caption_font, 14.0, p.light_gray)).aligned(Align::Center),
            ),
        ));
    }

    drawing
}

fn section_slide(p: &BrandPalette, title: &str) -> SlideDrawing {
    let mut drawing = SlideDrawing::new(p.secondary);
    drawing.push(Shape::text_box(
        "Title",
        Rect::inches(1.0, 2.0, 8.0, 1.5),
        TextFrame::single(
            Paragraph::new(title, TextStyle::new(p.title_font, 48.0, WHITE).bold()).aligned(Align::Center),
        )
        .anchored(Anchor::Middle),
    ));
    drawing
}

fn content_slide(p: &BrandPalette, title: &str, subtitle: &str, bullets: &[String]) -> SlideDrawing {
    let mut drawing = SlideDrawing::new(WHITE);

    drawing.push(Shape::text_box(
        "Title",
        Rect::inches(0.5, 0.5, 9.0, 0.7),
        TextFrame::single(Paragraph::new(
            title,
            TextStyle::new(p.title_font, 36.0, p.primary).bold(),
        )),
    ));

    drawing.push(Shape::rectangle(
        "Divider",
        Rect::inches(0.5, 1.25, 9.0, 0.03),
        Fill::Solid(p.accent),
    ));

    let mut bullets_top = 1.4;
    if !subtitle.is_empty() {
        drawing.push(Shape::text_box(
            "Subtitle",
            Rect::inches(0.5, 1.4, 9.0, 0.4),
            TextFrame::single(Paragraph::new(
                subtitle,
                TextStyle::new(p.caption_font, 18.0, p.dark).italic(),
            )),
        ));
        bullets_top = 1.9;
    }

    if !bullets.is_empty() {
        let base = TextStyle::new(p.body_font, 20.0, p.text);
        drawing.push(Shape::text_box(
            "Bullets",
            Rect::inches(0.8, bullets_top, 8.5, 3.5),
            TextFrame::new(bullet_paragraphs(bullets, base, 9.0, Align::Left, true)),
        ));
    }

    drawing
}

fn comparison_slide(p: &BrandPalette, title: &str, left: &[String], right: &[String]) -> SlideDrawing {
    let mut drawing = SlideDrawing::new(WHITE);

    drawing.push(Shape::text_box(
        "Title",
        Rect::inches(0.5, 0.5, 9.0, 0.6),
        TextFrame::single(
            Paragraph::new(title, TextStyle::new(p.title_font, 32.0, p.primary).bold()).aligned(Align::Center),
        ),
    ));

    let base = TextStyle::new(p.body_font, 17.0, p.text);
    for (name, x, items) in [("Left Column", 0.5, left), ("Right Column", 5.2, right)] {
        drawing.push(
            Shape::rectangle(name, Rect::inches(x, 1.3, 4.3, 3.5), Fill::Solid(p.light_gray))
                .with_outline(Outline {
                    color: p.accent,
                    width_pt: 3.0,
                })
                .with_text(TextFrame::new(column_paragraphs(items, base))),
        );
    }

    drawing
}

fn conclusion_slide(p: &BrandPalette, title: &str, bullets: &[String]) -> SlideDrawing {
    let mut drawing = SlideDrawing::new(p.dark);

    drawing.push(Shape::text_box(
        "Title",
        Rect::inches(1.0, 1.5, 8.0, 1.0),
        TextFrame::single(
            Paragraph::new(title, TextStyle::new(p.title_font, 48.0, WHITE).bold()).aligned(Align::Center),
        ),
    ));

    if !bullets.is_empty() {
        let base = TextStyle::new(p.body_font, 22.0, WHITE);
        drawing.push(Shape::text_box(
            "Statements",
            Rect::inches(1.5, 2.8, 7.0, 1.5),
            TextFrame::new(bullet_paragraphs(bullets, base, 0.0, Align::Center, false)),
        ));
    }

    drawing
}

/// One paragraph per bullet; nested entries are indented one level and drawn
/// smaller.
fn bullet_paragraphs(
    bullets: &[String],
    base: TextStyle,
    space_before: f64,
    align: Align,
    with_glyphs: bool,
) -> Vec<Paragraph> {
    bullets
        .iter()
        .map(|bullet| {
            let (level, text) = bullet_level(bullet);
            let style = if level > 0 {
                base.with_size(base.size_pt - NESTED_SIZE_STEP)
            } else {
                base
            };
            let mut paragraph = Paragraph::new(text.trim(), style).aligned(align).with_level(level);
            if space_before > 0.0 {
                paragraph = paragraph.with_space_before(space_before);
            }
            if with_glyphs {
                paragraph = paragraph.with_bullet(if level > 0 { NESTED_BULLET } else { BULLET });
            }
            paragraph
        })
        .collect()
}

/// Column items; a `**Heading**` entry is drawn bold without its markers.
fn column_paragraphs(items: &[String], base: TextStyle) -> Vec<Paragraph> {
    items
        .iter()
        .map(|item| {
            let trimmed = item.trim();
            match trimmed
                .strip_prefix("**")
                .and_then(|s| s.strip_suffix("**"))
                .filter(|s| !s.is_empty())
            {
                Some(heading) => Paragraph::new(heading, base.bold()).with_space_before(6.0),
                None => {
                    let (level, text) = bullet_level(item);
                    let style = if level > 0 {
                        base.with_size(base.size_pt - NESTED_SIZE_STEP)
                    } else {
                        base
                    };
                    Paragraph::new(text.trim(), style)
                        .with_level(level)
                        .with_space_before(6.0)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{inches, Fill};

    fn renderer() -> DeckRenderer<'static> {
        DeckRenderer::new()
    }

    #[test]
    fn test_title_layout() {
        let slide = Slide::title("Cloud", "Strategy").with_date("01/02/2025");
        let drawing = renderer().layout(&slide);
        assert_eq!(drawing.background, BRAND.primary);

        let title = drawing.shape("Title").unwrap();
        assert_eq!(title.rect, Rect::inches(1.0, 2.0, 8.0, 1.0));
        let para = &title.text.as_ref().unwrap().paragraphs[0];
        assert_eq!(para.style.size_pt, 54.0);
        assert_eq!(para.align, Align::Center);
        assert_eq!(para.style.color, WHITE);

        assert_eq!(drawing.shape("Subtitle").unwrap().plain_text(), "Strategy");
        assert_eq!(drawing.shape("Date").unwrap().plain_text(), "01/02/2025");
    }

    #[test]
    fn test_section_is_a_plain_divider() {
        let drawing = renderer().layout(&Slide::section("Context"));
        assert_eq!(drawing.background, BRAND.secondary);
        assert_eq!(drawing.shapes.len(), 1);
        assert_eq!(drawing.shapes[0].text.as_ref().unwrap().anchor, Anchor::Middle);
    }

    #[test]
    fn test_content_subtitle_pushes_bullets_down() {
        let plain = renderer().layout(&Slide::content("Benefits", ["Fast"]));
        assert_eq!(plain.shape("Bullets").unwrap().rect.y, inches(1.4));
        assert_eq!(plain.shape("Divider").unwrap().fill, Fill::Solid(BRAND.accent));

        let with_subtitle = renderer().layout(&Slide::content("Benefits", ["Fast"]).with_subtitle("Why"));
        assert_eq!(with_subtitle.shape("Bullets").unwrap().rect.y, inches(1.9));
        let sub = &with_subtitle.shape("Subtitle").unwrap().text.as_ref().unwrap().paragraphs[0];
        assert!(sub.style.italic);
        assert_eq!(sub.style.color, BRAND.dark);
    }

    #[test]
    fn test_nested_bullets_are_smaller() {
        let drawing = renderer().layout(&Slide::content("T", ["Top", "↳ Nested"]));
        let paras = &drawing.shape("Bullets").unwrap().text.as_ref().unwrap().paragraphs;
        assert_eq!(paras[0].level, 0);
        assert_eq!(paras[1].level, 1);
        assert_eq!(paras[1].text, "Nested");
        assert!(paras[1].style.size_pt < paras[0].style.size_pt);
    }

    #[test]
    fn test_comparison_columns() {
        let drawing = renderer().layout(&Slide::comparison("X", ["A", "B", "C", "D", "E"]));
        assert_eq!(drawing.background, WHITE);
        assert_eq!(drawing.shape("Left Column").unwrap().plain_text(), "A\nB");
        assert_eq!(drawing.shape("Right Column").unwrap().plain_text(), "C\nD\nE");
        let left = drawing.shape("Left Column").unwrap();
        assert_eq!(left.fill, Fill::Solid(BRAND.light_gray));
        assert_eq!(left.outline.unwrap().color, BRAND.accent);
    }

    #[test]
    fn test_column_heading_is_bold_without_markers() {
        let paras = column_paragraphs(&["**Before**".to_string(), "Manual".to_string()], TextStyle::new("F", 17.0, WHITE));
        assert_eq!(paras[0].text, "Before");
        assert!(paras[0].style.bold);
        assert!(!paras[1].style.bold);
    }

    #[test]
    fn test_conclusion_statements_are_centered_white() {
        let drawing = renderer().layout(&Slide::conclusion("Next", ["Launch", "Measure"]));
        assert_eq!(drawing.background, BRAND.dark);
        let paras = &drawing.shape("Statements").unwrap().text.as_ref().unwrap().paragraphs;
        assert_eq!(paras.len(), 2);
        assert!(paras.iter().all(|p| p.align == Align::Center && p.style.color == WHITE && p.bullet.is_none()));
    }

    #[test]
    fn test_chrome_is_identical_on_every_kind() {
        let mut deck = Presentation::new("Deck");
        deck.add_slide(Slide::title("A", ""));
        deck.add_slide(Slide::section("B"));
        deck.add_slide(Slide::content("C", ["x"]));
        let drawings = renderer().draw(&deck);

        for (idx, drawing) in drawings.iter().enumerate() {
            let band = drawing.shape("Header Band").unwrap();
            assert_eq!(band.rect, Rect::inches(0.0, 0.0, 10.0, 0.08));
            assert_eq!(drawing.shape("Wordmark").unwrap().plain_text(), "INFOTEL");
            assert_eq!(
                drawing.shape("Slide Number").unwrap().plain_text(),
                format!("{} / 3", idx + 1)
            );
        }
    }

    #[test]
    fn test_empty_title_renders_empty_region() {
        let drawing = renderer().layout(&Slide::content("", Vec::<String>::new()));
        assert_eq!(drawing.shape("Title").unwrap().plain_text(), "");
        assert!(drawing.shape("Bullets").is_none());
        assert!(drawing.to_xml().unwrap().contains("<a:endParaRPr"));
    }

    #[test]
    fn test_write_zero_slides() {
        let cursor = renderer()
            .write(&Presentation::default(), std::io::Cursor::new(Vec::new()))
            .unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(cursor.into_inner())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"ppt/presentation.xml"));
        assert!(!names.iter().any(|n| n.starts_with("ppt/slides/")));
    }
}
