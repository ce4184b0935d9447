//! Image-set discovery.
//!
//! The image set is built once at run start by listing the input directory,
//! and is read-only afterward. Paths are stored relative to the input
//! directory, with `/` separators, sorted lexicographically so the set (and
//! everything derived from it, pair lists included) is deterministic across
//! platforms and filesystems.

use crate::error::PipelineError;
use std::path::Path;

/// File extensions recognized as images (matched case-insensitively).
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// The ordered set of relative image paths under the input directory.
///
/// Guaranteed non-empty; discovery of an empty set is a fatal input error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSet {
    names: Vec<String>,
}

impl ImageSet {
    /// List image files directly under `image_dir` (non-recursive).
    ///
    /// # Errors
    ///
    /// [`PipelineError::Input`] when the directory cannot be read or
    /// contains no images.
    pub fn discover(image_dir: &Path) -> Result<Self, PipelineError> {
        let entries = std::fs::read_dir(image_dir).map_err(|e| {
            PipelineError::Input(format!(
                "cannot read image directory '{}': {e}",
                image_dir.display()
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                PipelineError::Input(format!(
                    "cannot read image directory '{}': {e}",
                    image_dir.display()
                ))
            })?;
            let path = entry.path();
            if !path.is_file() || !is_image(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        if names.is_empty() {
            return Err(PipelineError::Input(format!(
                "no images found in '{}'",
                image_dir.display()
            )));
        }

        names.sort_unstable();
        Ok(Self { names })
    }

    /// Build an image set from already-known relative names (tests, or
    /// callers with their own discovery).
    pub fn from_names(mut names: Vec<String>) -> Result<Self, PipelineError> {
        if names.is_empty() {
            return Err(PipelineError::Input("image set is empty".to_string()));
        }
        names.sort_unstable();
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        // Non-empty by construction; kept for clippy's len-without-is-empty.
        self.names.is_empty()
    }

    /// Relative image names, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.jpg"), b"").unwrap();
        fs::write(dir.path().join("a.PNG"), b"").unwrap();
        fs::write(dir.path().join("c.jpeg"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub.jpg")).unwrap(); // directory, not an image

        let set = ImageSet::discover(dir.path()).unwrap();
        assert_eq!(set.names(), ["a.PNG", "b.jpg", "c.jpeg"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn empty_directory_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), b"").unwrap();

        let err = ImageSet::discover(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
        assert!(err.to_string().contains("no images"));
    }

    #[test]
    fn missing_directory_is_an_input_error() {
        let err = ImageSet::discover(Path::new("/nonexistent/for/sure")).unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
    }

    #[test]
    fn from_names_rejects_empty() {
        assert!(ImageSet::from_names(vec![]).is_err());
        let set = ImageSet::from_names(vec!["b.jpg".into(), "a.jpg".into()]).unwrap();
        assert_eq!(set.names(), ["a.jpg", "b.jpg"]);
    }
}
