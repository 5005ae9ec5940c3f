//! Source text from uploaded documents.

use crate::reader::PptxReader;
use deck_core::{Error, Result, SourceFormat};
use std::io::Cursor;

/// Text content of an uploaded document.
///
/// The format is detected from the leading bytes first and the file
/// extension second. Plain text is decoded as lossy UTF-8; decks yield the text
/// of every slide in presentation order.
pub fn source_text(file_name: &str, bytes: &[u8]) -> Result<String> {
    let format = SourceFormat::detect(file_name, bytes).ok_or_else(|| {
        Error::UnsupportedFormat(format!("cannot extract text from '{}'", file_name))
    })?;

    match format {
        SourceFormat::PlainText => {
            let text = String::from_utf8_lossy(bytes);
            Ok(text.trim_start_matches('\u{feff}').to_string())
        }
        SourceFormat::Pptx => {
            let deck = PptxReader::new().read(Cursor::new(bytes), file_name)?;
            log::debug!("Extracted {} slide(s) from {}", deck.slides.len(), file_name);
            Ok(deck.plain_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeckRenderer;
    use deck_core::{Presentation, Slide};

    #[test]
    fn test_plain_text() {
        let text = source_text("notes.md", "\u{feff}# Cloud\nFast".as_bytes()).unwrap();
        assert_eq!(text, "# Cloud\nFast");
    }

    #[test]
    fn test_unsupported() {
        let err = source_text("report.pdf", b"%PDF-1.7").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_deck_text() {
        let mut deck = Presentation::new("Cloud");
        deck.add_slide(Slide::title("Cloud", "Why now"));
        deck.add_slide(Slide::content("Benefits", ["Fast", "Secure"]));
        let bytes = DeckRenderer::new()
            .write(&deck, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();

        // Detected by content even with a misleading name.
        let text = source_text("upload.bin", &bytes).unwrap();
        assert!(text.contains("Why now"));
        assert!(text.contains("Benefits"));
        assert!(text.find("Cloud").unwrap() < text.find("Benefits").unwrap());
        assert!(text.contains("\n\n"));
    }
}
