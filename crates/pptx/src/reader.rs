//! PPTX reader: text and background of every slide, in presentation order.
//!
//! Used to pull source text out of uploaded decks and to check what the
//! renderer actually wrote.

use deck_core::{Error, ExtractedDeck, ExtractedSlide, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Reader for PPTX (Office Open XML) files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a deck from disk.
    pub fn read_path(&self, path: &Path) -> Result<ExtractedDeck> {
        let file = File::open(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.read(BufReader::new(file), &filename)
    }

    /// Read a deck from any seekable source.
    pub fn read<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<ExtractedDeck> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut deck = ExtractedDeck::new(filename);

        let slide_order = self.slide_order(&mut archive)?;
        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.read_slide(&mut archive, slide_path, idx + 1)?;
            deck.add_slide(slide);
        }

        log::debug!("Read {} slide(s) from {}", deck.slides.len(), filename);
        Ok(deck)
    }

    /// Slide part paths in presentation order.
    ///
    /// The order comes from `sldIdLst` in `presentation.xml`; when that list is
    /// missing, slides are ordered by the number in their relationship id.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = read_file_from_archive(archive, PRESENTATION_RELS_PATH)?;
        let slide_rels = parse_slide_relationships(&rels_content)?;

        let listed = match read_file_from_archive(archive, PRESENTATION_PATH) {
            Ok(content) => parse_slide_id_list(&content),
            Err(e) => {
                log::warn!("No readable presentation part, falling back to id order: {}", e);
                Vec::new()
            }
        };

        if !listed.is_empty() {
            let by_id: HashMap<&str, &str> = slide_rels
                .iter()
                .map(|(id, path)| (id.as_str(), path.as_str()))
                .collect();
            return Ok(listed
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|p| p.to_string()))
                .collect());
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .into_iter()
            .map(|(id, path)| {
                let order = extract_slide_number(&id).or_else(|| extract_slide_number(&path));
                (path, order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn read_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<ExtractedSlide> {
        let content = read_file_from_archive(archive, slide_path)?;
        let mut slide = ExtractedSlide::new(slide_number);

        let parsed = extract_slide_content(&content);
        for shape in parsed.shapes {
            if !shape.text.trim().is_empty() {
                slide.add_line_with_position(&shape.text, shape.y, shape.x);
            }
        }
        slide.background = parsed.background;

        // Top-to-bottom, then left-to-right
        slide.sort_by_position();

        Ok(slide)
    }
}

/// Information about a shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
}

#[derive(Debug, Default)]
struct SlideContent {
    shapes: Vec<ShapeInfo>,
    background: Option<String>,
}

/// `(relationship id, archive path)` of every slide relationship.
fn parse_slide_relationships(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut slides = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let rel_type = attr_value(e, b"Type").unwrap_or_default();
                let target = attr_value(e, b"Target").unwrap_or_default();
                let id = attr_value(e, b"Id").unwrap_or_default();

                // Slide relationships end in "/slide"; layouts, masters and notes do not
                if rel_type.ends_with("/slide") {
                    let full_path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("ppt/{}", target),
                    };
                    slides.push((id, full_path));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(slides)
}

/// Relationship ids listed in `sldIdLst`, in order.
fn parse_slide_id_list(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if local_name(e.name().as_ref()) == b"sldId" {
                    if let Some(id) = attr_value(e, b"r:id") {
                        ids.push(id);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error in presentation part (continuing): {}", e);
                break;
            }
            _ => {}
        }
    }

    ids
}

/// Shapes with text and position, plus the solid background color.
fn extract_slide_content(xml_content: &str) -> SlideContent {
    let mut content = SlideContent::default();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut in_text_body = false;
    let mut in_paragraph = false;
    let mut in_background = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    current_shape = Some(ShapeInfo::default());
                }
                b"bg" => in_background = true,
                b"txBody" => in_text_body = true,
                b"p" if in_text_body => {
                    in_paragraph = true;
                    if !current_text.is_empty() {
                        current_text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"off" => {
                    if let Some(ref mut shape) = current_shape {
                        read_offset(e, shape);
                    }
                }
                b"srgbClr" if in_background && content.background.is_none() => {
                    content.background = attr_value(e, b"val");
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e.unescape().unwrap_or_default();
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    if let Some(mut shape) = current_shape.take() {
                        shape.text = current_text.trim().to_string();
                        if !shape.text.is_empty() {
                            content.shapes.push(shape);
                        }
                    }
                    current_text.clear();
                    in_text_body = false;
                    in_paragraph = false;
                }
                b"bg" => in_background = false,
                b"txBody" => in_text_body = false,
                b"p" => in_paragraph = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (continuing): {}", e);
                break;
            }
            _ => {}
        }
    }

    content
}

fn read_offset(e: &BytesStart<'_>, shape: &mut ShapeInfo) {
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"x" => {
                if let Ok(x) = value.parse::<f64>() {
                    shape.x = x;
                }
            }
            b"y" => {
                if let Ok(y) = value.parse::<f64>() {
                    shape.y = y;
                }
            }
            _ => {}
        }
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Read a file from the ZIP archive.
fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_slide_id_list_order() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst>
            <p:sldId id="257" r:id="rId9"/><p:sldId id="256" r:id="rId3"/>
            </p:sldIdLst></p:presentation>"#;
        assert_eq!(parse_slide_id_list(xml), vec!["rId9", "rId3"]);
    }

    #[test]
    fn test_relationships_skip_layouts_and_notes() {
        let xml = r#"<Relationships>
            <Relationship Id="rId1" Type="http://x/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
            <Relationship Id="rId3" Type="http://x/relationships/slide" Target="slides/slide1.xml"/>
            <Relationship Id="rId4" Type="http://x/relationships/notesSlide" Target="notesSlides/notesSlide1.xml"/>
            <Relationship Id="rId5" Type="http://x/relationships/slide" Target="/ppt/slides/slide2.xml"/>
            </Relationships>"#;
        let rels = parse_slide_relationships(xml).unwrap();
        assert_eq!(
            rels,
            vec![
                ("rId3".to_string(), "ppt/slides/slide1.xml".to_string()),
                ("rId5".to_string(), "ppt/slides/slide2.xml".to_string()),
            ]
        );
    }

    #[test]
    fn test_slide_content_background_and_text() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld>
            <p:bg><p:bgPr><a:solidFill><a:srgbClr val="005091"/></a:solidFill></p:bgPr></p:bg>
            <p:spTree>
              <p:sp><p:spPr><a:xfrm><a:off x="100" y="200"/></a:xfrm><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill></p:spPr>
                <p:txBody><a:p><a:r><a:t>Fast</a:t></a:r></a:p><a:p><a:r><a:t>Secure</a:t></a:r></a:p></p:txBody></p:sp>
            </p:spTree></p:cSld></p:sld>"#;
        let content = extract_slide_content(xml);
        assert_eq!(content.background.as_deref(), Some("005091"));
        assert_eq!(content.shapes.len(), 1);
        assert_eq!(content.shapes[0].text, "Fast\nSecure");
        assert_eq!(content.shapes[0].y, 200.0);
    }
}
