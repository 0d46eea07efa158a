//! Artifact naming and content digests.

use comicsmith_core::extension_for_mime;
use comicsmith_error::{PersistenceError, PersistenceErrorKind};
use sha2::{Digest, Sha256};

/// Reduce a display name to characters that are safe in file names.
///
/// Anything outside `[A-Za-z0-9_-]` becomes `_`; leading and trailing
/// underscores are dropped.
///
/// # Errors
///
/// Returns `InvalidName` when nothing usable is left.
///
/// # Examples
///
/// ```
/// use comicsmith_storage::sanitize_name;
///
/// assert_eq!(sanitize_name("Panel 1: Intro").unwrap(), "Panel_1__Intro");
/// assert!(sanitize_name("../").is_err());
/// ```
pub fn sanitize_name(display_name: &str) -> Result<String, PersistenceError> {
    let cleaned: String = display_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        return Err(PersistenceError::new(PersistenceErrorKind::InvalidName(
            display_name.to_string(),
        )));
    }
    Ok(cleaned.to_string())
}

/// Key under which display names share artifact files.
///
/// Two names with the same key would overwrite each other's artifacts in one
/// run. The key is case-folded, since the working tree may live on a
/// case-insensitive file system. Returns `None` for unusable names.
///
/// # Examples
///
/// ```
/// use comicsmith_storage::collision_key;
///
/// assert_eq!(collision_key("panel 1"), collision_key("Panel_1"));
/// assert_ne!(collision_key("panel 1"), collision_key("panel 2"));
/// ```
pub fn collision_key(display_name: &str) -> Option<String> {
    sanitize_name(display_name)
        .ok()
        .map(|name| name.to_ascii_lowercase())
}

/// Stable artifact name for a display name at a run sequence.
///
/// # Errors
///
/// Same as [`sanitize_name`].
pub fn artifact_name(display_name: &str, sequence: u64) -> Result<String, PersistenceError> {
    Ok(format!("{}_{}", sanitize_name(display_name)?, sequence))
}

/// File name of an artifact in the working tree.
pub fn artifact_file_name(name: &str, mime: &str) -> String {
    format!("{}.{}", name, extension_for_mime(mime))
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
