//! Registry backed by a directory on disk.

use crate::atomic::write_atomic;
use crate::naming::content_digest;
use async_trait::async_trait;
use comicsmith_core::GeneratedImage;
use comicsmith_error::{RegistryError, RegistryErrorKind};
use comicsmith_interface::ArtifactRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

const DATA_EXT: &str = "bin";
const META_EXT: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactMeta {
    name: String,
    mime: String,
    digest: String,
    size: usize,
}

/// Registry that stores each artifact as `<name>.bin` plus a `<name>.json`
/// sidecar holding its MIME type and SHA-256 digest.
///
/// Both files are written atomically; the sidecar is written last, so an
/// artifact only becomes visible once its data is complete. Reads verify
/// the digest.
///
/// Writes and reads of one name are serialized across clones of the
/// registry, so concurrent puts never pair one writer's data with another's
/// sidecar; the last put wins.
#[derive(Debug, Clone)]
pub struct FilesystemArtifactRegistry {
    root: PathBuf,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl FilesystemArtifactRegistry {
    /// Creates a registry rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn name_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Registry root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, DATA_EXT))
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, META_EXT))
    }
}

fn io_error(context: &str, e: impl std::fmt::Display) -> RegistryError {
    RegistryError::new(RegistryErrorKind::Io(format!("{}: {}", context, e)))
}

#[async_trait]
impl ArtifactRegistry for FilesystemArtifactRegistry {
    #[instrument(skip(self, image), fields(root = %self.root.display(), size = image.bytes().len()))]
    async fn put(&self, name: &str, image: &GeneratedImage) -> Result<(), RegistryError> {
        let meta = ArtifactMeta {
            name: name.to_string(),
            mime: image.mime().clone(),
            digest: content_digest(image.bytes()),
            size: image.bytes().len(),
        };
        let meta_json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| io_error("Failed to encode metadata", e))?;

        let lock = self.name_lock(name).await;
        let _held = lock.lock().await;
        write_atomic(self.data_path(name), image.bytes().clone())
            .await
            .map_err(|e| io_error("Failed to write artifact data", e))?;
        write_atomic(self.meta_path(name), meta_json)
            .await
            .map_err(|e| io_error("Failed to write artifact metadata", e))?;

        debug!(digest = %meta.digest, "Stored artifact on disk");
        Ok(())
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn get(&self, name: &str) -> Result<GeneratedImage, RegistryError> {
        let lock = self.name_lock(name).await;
        let _held = lock.lock().await;
        let meta_raw = match tokio::fs::read(self.meta_path(name)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RegistryError::new(RegistryErrorKind::NotFound(
                    name.to_string(),
                )));
            }
            Err(e) => return Err(io_error("Failed to read artifact metadata", e)),
        };
        let meta: ArtifactMeta = serde_json::from_slice(&meta_raw)
            .map_err(|e| io_error("Corrupt artifact metadata", e))?;
        let bytes = tokio::fs::read(self.data_path(name))
            .await
            .map_err(|e| io_error("Failed to read artifact data", e))?;

        let actual = content_digest(&bytes);
        if actual != meta.digest {
            warn!(expected = %meta.digest, actual = %actual, "Artifact digest mismatch");
            return Err(RegistryError::new(RegistryErrorKind::HashMismatch {
                expected: meta.digest,
                actual,
            }));
        }
        Ok(GeneratedImage::new(bytes, meta.mime))
    }

    async fn list(&self) -> Result<Vec<String>, RegistryError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("Failed to list registry", e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("Failed to list registry", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn registry_name(&self) -> &str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_list() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FilesystemArtifactRegistry::new(dir.path().join("registry"));

        assert!(registry.list().await.unwrap().is_empty());
        registry
            .put("b_1", &GeneratedImage::new(vec![9, 9], "image/jpeg"))
            .await
            .unwrap();
        registry.put("a_1", &GeneratedImage::png(vec![1])).await.unwrap();

        assert_eq!(registry.list().await.unwrap(), vec!["a_1", "b_1"]);
        let image = registry.get("b_1").await.unwrap();
        assert_eq!(image.mime(), "image/jpeg");
        assert_eq!(image.bytes(), &vec![9u8, 9]);
    }

    #[tokio::test]
    async fn test_tampered_data_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FilesystemArtifactRegistry::new(dir.path());
        registry.put("a_1", &GeneratedImage::png(vec![1, 2])).await.unwrap();

        std::fs::write(dir.path().join("a_1.bin"), [3, 4]).unwrap();

        let err = registry.get("a_1").await.unwrap_err();
        assert!(matches!(err.kind, RegistryErrorKind::HashMismatch { .. }));
    }
}
