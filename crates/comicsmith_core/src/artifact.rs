//! Persisted, versioned image artifacts.

use serde::{Deserialize, Serialize};

/// Reference to an image persisted by the artifact store.
///
/// An `ArtifactRef` is never mutated. A rerun of the same panel produces a
/// new reference with a higher `sequence`, leaving the older one in place.
///
/// # Examples
///
/// ```
/// use comicsmith_core::ArtifactRef;
///
/// let artifact = ArtifactRef::builder()
///     .name("panel_1_3")
///     .display_name("panel_1")
///     .sequence(3u64)
///     .bytes(vec![1, 2, 3])
///     .mime("image/png")
///     .path("images/panel_1_3.png")
///     .digest("abc")
///     .build()
///     .unwrap();
///
/// assert_eq!(artifact.name(), "panel_1_3");
/// assert_eq!(*artifact.sequence(), 3);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ArtifactRef {
    /// Stable artifact name derived from display name and sequence
    name: String,
    /// Display name of the panel that produced the artifact
    display_name: String,
    /// Run sequence the artifact was saved under
    sequence: u64,
    /// Image bytes as persisted
    #[serde(skip)]
    bytes: Vec<u8>,
    /// MIME type of the image
    mime: String,
    /// Path of the local copy, relative to the output root
    path: String,
    /// Hex-encoded SHA-256 of the bytes
    digest: String,
}

impl ArtifactRef {
    /// Returns a builder for constructing an ArtifactRef.
    pub fn builder() -> ArtifactRefBuilder {
        ArtifactRefBuilder::default()
    }
}
