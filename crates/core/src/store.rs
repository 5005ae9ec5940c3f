//! On-disk artifact storage.
//!
//! Rendered decks and the scratch markup kept between "produce plan" and
//! "confirm and render" live in one directory, each under a name embedding a
//! short random identifier so concurrent requests never share a path.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Length of generated identifiers.
const ID_LEN: usize = 8;

/// Directory holding scratch markup and rendered decks.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh short identifier.
    pub fn new_id() -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(ID_LEN);
        id
    }

    /// Path of the scratch markup for `id`.
    pub fn markup_path(&self, id: &str) -> Result<PathBuf> {
        Ok(self.root.join(format!("presentation_{}.html", checked_id(id)?)))
    }

    /// File name of the deck for `id`.
    pub fn deck_file_name(id: &str) -> String {
        format!("presentation_{}.pptx", id)
    }

    /// Path of the deck for `id`, creating the root directory if needed.
    pub fn output_path(&self, id: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        Ok(self.root.join(Self::deck_file_name(checked_id(id)?)))
    }

    /// File name of the diagram for `id`.
    pub fn diagram_file_name(id: &str) -> String {
        format!("diagram_{}.pptx", id)
    }

    /// Path of the diagram for `id`, creating the root directory if needed.
    pub fn diagram_path(&self, id: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        Ok(self.root.join(Self::diagram_file_name(checked_id(id)?)))
    }

    /// Store scratch markup under `id`.
    pub fn save_markup(&self, id: &str, markup: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.markup_path(id)?;
        fs::write(&path, markup)?;
        log::debug!("Stored markup {} ({} bytes)", path.display(), markup.len());
        Ok(path)
    }

    /// Load scratch markup stored under `id`.
    pub fn load_markup(&self, id: &str) -> Result<String> {
        let path = self.markup_path(id)?;
        match fs::read_to_string(&path) {
            Ok(markup) => Ok(markup),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("markup '{}'", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete scratch markup stored under `id`. A missing file is not an error.
    pub fn remove_markup(&self, id: &str) -> Result<()> {
        let path = self.markup_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a download request to an existing file inside the store.
    pub fn resolve_download(&self, file_name: &str) -> Result<PathBuf> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(Error::InvalidInput(format!("invalid file name '{}'", file_name)));
        }

        let path = self.root.join(file_name);
        if !path.is_file() {
            return Err(Error::NotFound(file_name.to_string()));
        }
        Ok(path)
    }
}

/// Identifiers are embedded in file names; only ASCII alphanumerics and `-`
/// are accepted.
fn checked_id(id: &str) -> Result<&str> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        Ok(id)
    } else {
        Err(Error::InvalidInput(format!("invalid identifier '{}'", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_short_and_unique() {
        let a = ArtifactStore::new_id();
        let b = ArtifactStore::new_id();
        assert_eq!(a.len(), ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_markup_round_trip_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("generated"));

        let id = ArtifactStore::new_id();
        store.save_markup(&id, "<html></html>").unwrap();
        assert_eq!(store.load_markup(&id).unwrap(), "<html></html>");

        store.remove_markup(&id).unwrap();
        assert!(matches!(store.load_markup(&id), Err(Error::NotFound(_))));
        // Removing twice is fine
        store.remove_markup(&id).unwrap();
    }

    #[test]
    fn test_rejects_path_like_identifiers() {
        let store = ArtifactStore::new("generated_files");
        assert!(matches!(store.markup_path("../etc"), Err(Error::InvalidInput(_))));
        assert!(matches!(store.markup_path(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_resolve_download() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store.output_path("abc123").unwrap();
        fs::write(&path, b"deck").unwrap();

        assert_eq!(store.resolve_download("presentation_abc123.pptx").unwrap(), path);
        let diagram = store.diagram_path("abc123").unwrap();
        fs::write(&diagram, b"diagram").unwrap();
        assert_eq!(store.resolve_download("diagram_abc123.pptx").unwrap(), diagram);
        assert!(matches!(store.diagram_path("../x"), Err(Error::InvalidInput(_))));
        assert!(matches!(store.resolve_download("missing.pptx"), Err(Error::NotFound(_))));
        assert!(matches!(store.resolve_download("../secret"), Err(Error::InvalidInput(_))));
        assert!(matches!(store.resolve_download("a/b.pptx"), Err(Error::InvalidInput(_))));
    }
}
