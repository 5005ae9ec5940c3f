//! Source content of a deck request: an uploaded file or the description.

use crate::errors::AppError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decode a base64 upload and extract its text.
///
/// A `data:<mime>;base64,` prefix is accepted and ignored.
pub fn upload_text(file_name: &str, file_base64: &str) -> Result<String, AppError> {
    let encoded = match file_base64.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => file_base64,
    };
    let cleaned: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("file_base64 is not valid base64: {}", e)))?;

    Ok(deck_pptx::source_text(file_name, &bytes)?)
}

/// Pick the source text: an uploaded file first, then the description.
pub fn resolve_source(
    description: Option<&str>,
    file_name: Option<&str>,
    file_base64: Option<&str>,
) -> Result<String, AppError> {
    if let Some(data) = file_base64.filter(|d| !d.trim().is_empty()) {
        let name = file_name.unwrap_or("upload.txt");
        log::info!("Extracting source from uploaded file {}", name);
        return upload_text(name, data);
    }

    match description.filter(|d| !d.trim().is_empty()) {
        Some(description) => Ok(description.to_string()),
        None => Err(AppError::BadRequest(
            "Provide a description or upload a file".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_text() {
        let encoded = STANDARD.encode("Cloud migration plan for 2025");
        assert_eq!(
            upload_text("notes.txt", &encoded).unwrap(),
            "Cloud migration plan for 2025"
        );

        let data_url = format!("data:text/plain;base64,{}", encoded);
        assert_eq!(
            upload_text("notes.txt", &data_url).unwrap(),
            "Cloud migration plan for 2025"
        );
    }

    #[test]
    fn test_upload_errors() {
        assert!(matches!(
            upload_text("notes.txt", "***"),
            Err(AppError::BadRequest(_))
        ));

        let encoded = STANDARD.encode("%PDF-1.7");
        assert!(matches!(
            upload_text("report.pdf", &encoded),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_resolve_source_priority() {
        let encoded = STANDARD.encode("from the file");
        let source = resolve_source(Some("from the description"), Some("a.md"), Some(&encoded)).unwrap();
        assert_eq!(source, "from the file");

        let source = resolve_source(Some("from the description"), None, Some("  ")).unwrap();
        assert_eq!(source, "from the description");

        assert!(matches!(
            resolve_source(Some("   "), None, None),
            Err(AppError::BadRequest(_))
        ));
    }
}
