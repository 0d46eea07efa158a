//! Completed panels and the comic they are assembled into.

use crate::ArtifactRef;
use serde::{Deserialize, Serialize};

/// Where a rendered panel finds its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum ImageRef {
    /// Path relative to the document file
    Path(String),
    /// Artifact persisted by the store; its local path is used
    Artifact(ArtifactRef),
}

impl From<&str> for ImageRef {
    fn from(path: &str) -> Self {
        ImageRef::Path(path.to_string())
    }
}

impl ImageRef {
    /// Path relative to the document file.
    pub fn relative_path(&self) -> &str {
        match self {
            ImageRef::Path(path) => path,
            ImageRef::Artifact(artifact) => artifact.path(),
        }
    }
}

/// Display position of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Ordinal {
    /// Not yet derived from the description
    #[default]
    Unresolved,
    /// Parsed from the description text
    Parsed(u64),
    /// Description carried no usable number; sorts last
    Fallback,
}

impl Ordinal {
    /// Whether the ordinal fell back to the sentinel.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Ordinal::Fallback)
    }

    /// Whether the ordinal has been derived.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Ordinal::Unresolved)
    }
}

/// One panel ready for document assembly.
///
/// The ordinal is derived from `description`; callers never supply it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PanelRecord {
    /// Caption text shown under the image
    description: String,
    /// Image to display
    image_ref: ImageRef,
    /// Derived display position
    #[serde(default)]
    ordinal: Ordinal,
    /// Stands in for a failed panel
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[getter(skip)]
    placeholder: bool,
}

impl PanelRecord {
    /// Creates an unresolved record.
    pub fn new(description: impl Into<String>, image_ref: impl Into<ImageRef>) -> Self {
        Self {
            description: description.into(),
            image_ref: image_ref.into(),
            ordinal: Ordinal::Unresolved,
            placeholder: false,
        }
    }

    /// Creates a record showing the placeholder image for a failed panel.
    pub fn placeholder(description: impl Into<String>, image_ref: impl Into<ImageRef>) -> Self {
        Self {
            placeholder: true,
            ..Self::new(description, image_ref)
        }
    }

    /// Whether this record stands in for a failed panel.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Returns a copy of this record carrying the given ordinal.
    pub fn with_ordinal(mut self, ordinal: Ordinal) -> Self {
        self.ordinal = ordinal;
        self
    }
}

/// A titled, ordered collection of panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Comic {
    /// Document title
    title: String,
    /// Panels in display order
    panels: Vec<PanelRecord>,
}

impl Comic {
    /// Builds a comic, deriving display order from each panel's description.
    ///
    /// Creation order of `panels` does not matter; ties keep their input order.
    pub fn new(title: impl Into<String>, panels: Vec<PanelRecord>) -> Self {
        Self {
            title: title.into(),
            panels: crate::PanelOrderResolver::order(panels),
        }
    }
}
