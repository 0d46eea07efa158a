//! Panel manifests: rendering input that needs no synthesis.

use comicsmith_core::PanelRecord;
use comicsmith_error::RenderError;
use comicsmith_storage::write_atomic_blocking;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// File name of the manifest written next to the document.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Caption text
    pub description: String,
    /// Image path relative to the document
    pub image: String,
    /// Panel failed and `image` is the placeholder
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl From<&PanelRecord> for ManifestEntry {
    fn from(record: &PanelRecord) -> Self {
        Self {
            description: record.description().clone(),
            image: record.image_ref().relative_path().to_string(),
            failed: record.is_placeholder(),
        }
    }
}

impl From<ManifestEntry> for PanelRecord {
    fn from(entry: ManifestEntry) -> Self {
        if entry.failed {
            PanelRecord::placeholder(entry.description, entry.image)
        } else {
            PanelRecord::new(entry.description, entry.image)
        }
    }
}

/// Read a JSON array of `{description, image}` entries.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid manifest.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_manifest(path: impl AsRef<Path>) -> Result<Vec<PanelRecord>, RenderError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| RenderError::new(format!("Failed to read {}: {}", path.display(), e)))?;
    let entries: Vec<ManifestEntry> = serde_json::from_str(&raw)
        .map_err(|e| RenderError::new(format!("Invalid manifest {}: {}", path.display(), e)))?;
    debug!(entries = entries.len(), "Read manifest");
    Ok(entries.into_iter().map(PanelRecord::from).collect())
}

/// Write records as a manifest, atomically.
///
/// # Errors
///
/// Returns an error if the manifest cannot be encoded or written.
pub fn write_manifest(path: impl AsRef<Path>, records: &[PanelRecord]) -> Result<(), RenderError> {
    let path = path.as_ref();
    let entries: Vec<ManifestEntry> = records.iter().map(ManifestEntry::from).collect();
    let json = serde_json::to_vec_pretty(&entries)
        .map_err(|e| RenderError::new(format!("Failed to encode manifest: {}", e)))?;
    write_atomic_blocking(path, &json)
        .map_err(|e| RenderError::new(format!("Failed to write {}: {}", path.display(), e)))
}
