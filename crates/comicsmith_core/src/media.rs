//! Image payloads returned by a synthesizer.

use serde::{Deserialize, Serialize};

/// MIME type assumed when a provider omits one.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Raw image bytes plus their MIME type.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_getters::Dissolve,
)]
pub struct GeneratedImage {
    /// Encoded image data
    bytes: Vec<u8>,
    /// MIME type of the image
    mime: String,
}

impl GeneratedImage {
    /// Creates a new image payload.
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Creates a PNG payload.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(bytes, DEFAULT_IMAGE_MIME)
    }
}

/// File extension for an image MIME type.
///
/// Unknown types fall back to `png`, which is what every supported model
/// returns by default.
///
/// # Examples
///
/// ```
/// use comicsmith_core::extension_for_mime;
///
/// assert_eq!(extension_for_mime("image/jpeg"), "jpg");
/// assert_eq!(extension_for_mime("application/octet-stream"), "png");
/// ```
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Every extension [`extension_for_mime`] can produce.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "webp", "gif"];

/// MIME type for a file extension, used when editing images read from disk.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => DEFAULT_IMAGE_MIME,
    }
}

/// A valid 1x1 transparent PNG.
///
/// Stands in for a panel image when synthesis is simulated or a failed panel
/// is rendered with an explicit placeholder.
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0B, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x60, 0x00, 0x02, 0x00,
    0x00, 0x05, 0x00, 0x01, 0x7A, 0x5E, 0xAB, 0x3F, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44,
    0xAE, 0x42, 0x60, 0x82,
];
