//! Working-tree layout of a run's output directory.

use std::path::{Path, PathBuf};

/// Directory, relative to the output root, that holds panel images.
pub const IMAGES_DIR: &str = "images";
/// File name of the rendered document.
pub const DOCUMENT_FILE: &str = "comic.html";
/// File name of the image shown for failed panels.
pub const PLACEHOLDER_FILE: &str = "placeholder.png";

/// Paths under one output root.
///
/// ```text
/// <root>/
///   comic.html
///   images/
///     panel_1_0.png
///     placeholder.png
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct OutputLayout {
    /// Output root directory
    root: PathBuf,
}

impl OutputLayout {
    /// Creates a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute directory for panel images.
    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Absolute path of the rendered document.
    pub fn document_path(&self) -> PathBuf {
        self.root.join(DOCUMENT_FILE)
    }

    /// Document-relative path of an image file.
    pub fn relative_image_path(&self, file_name: &str) -> String {
        format!("{}/{}", IMAGES_DIR, file_name)
    }

    /// Document-relative path of the failed-panel placeholder.
    pub fn placeholder_relative_path(&self) -> String {
        self.relative_image_path(PLACEHOLDER_FILE)
    }

    /// Absolute path for a document-relative path.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("/tmp/out");
        assert_eq!(layout.document_path(), PathBuf::from("/tmp/out/comic.html"));
        assert_eq!(layout.relative_image_path("a_1.png"), "images/a_1.png");
        assert_eq!(
            layout.resolve(layout.placeholder_relative_path()),
            PathBuf::from("/tmp/out/images/placeholder.png")
        );
    }
}
