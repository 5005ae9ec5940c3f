//! Detection of uploaded source document formats.

/// The format of an uploaded source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Plain UTF-8 text (txt, md, csv, json).
    PlainText,
    /// Modern PPTX (Office Open XML).
    Pptx,
}

impl SourceFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "md" | "markdown" | "csv" | "json" => Some(Self::PlainText),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    ///
    /// Only container formats are recognised; plain text has no signature.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        None
    }

    /// Detect format from content first, then from the file name.
    pub fn detect(file_name: &str, bytes: &[u8]) -> Option<Self> {
        Self::from_magic(bytes).or_else(|| {
            std::path::Path::new(file_name)
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Self::from_extension)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(SourceFormat::from_extension("TXT"), Some(SourceFormat::PlainText));
        assert_eq!(SourceFormat::from_extension("md"), Some(SourceFormat::PlainText));
        assert_eq!(SourceFormat::from_extension("pptx"), Some(SourceFormat::Pptx));
        assert_eq!(SourceFormat::from_extension("pdf"), None);
    }

    #[test]
    fn test_magic_wins_over_extension() {
        let zip_header = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00];
        assert_eq!(SourceFormat::detect("notes.txt", &zip_header), Some(SourceFormat::Pptx));
        assert_eq!(SourceFormat::detect("notes.txt", b"hello world"), Some(SourceFormat::PlainText));
        assert_eq!(SourceFormat::detect("scan.pdf", b"%PDF-1.7"), None);
        assert_eq!(SourceFormat::detect("x", b"PK"), None);
    }
}
