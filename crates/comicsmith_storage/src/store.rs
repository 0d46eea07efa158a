//! The artifact store: versioned, dual-sink persistence.

use crate::atomic::write_atomic;
use crate::layout::OutputLayout;
use crate::naming::{artifact_file_name, artifact_name, content_digest};
use comicsmith_core::{ArtifactRef, GeneratedImage, IMAGE_EXTENSIONS, mime_for_extension};
use comicsmith_error::{
    PersistenceError, PersistenceErrorKind, RegistryError, RegistryErrorKind,
};
use comicsmith_interface::ArtifactRegistry;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Persists images under `{display_name}_{sequence}` in the working tree and
/// in a durable registry.
///
/// Saving the same `(display_name, sequence)` twice overwrites; a higher
/// sequence produces a new artifact and leaves earlier ones untouched.
#[derive(Clone)]
pub struct ArtifactStore {
    layout: OutputLayout,
    registry: Arc<dyn ArtifactRegistry>,
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("layout", &self.layout)
            .field("registry", &self.registry.registry_name())
            .finish()
    }
}

impl ArtifactStore {
    /// Creates a store writing under `layout` and into `registry`.
    pub fn new(layout: OutputLayout, registry: Arc<dyn ArtifactRegistry>) -> Self {
        Self { layout, registry }
    }

    /// Working-tree layout.
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Durable registry.
    pub fn registry(&self) -> &Arc<dyn ArtifactRegistry> {
        &self.registry
    }

    /// Persist an image to both sinks.
    ///
    /// Both writes are always attempted and run concurrently. The local copy
    /// is written atomically, so a reader of the working tree sees either the
    /// previous file or the complete new one. A copy of the same artifact
    /// saved earlier under another image format is removed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` if the display name has no usable characters.
    /// Otherwise the error names which sink, if any, holds the artifact.
    #[instrument(skip(self, bytes), fields(size = bytes.len(), registry = self.registry.registry_name()))]
    pub async fn save(
        &self,
        display_name: &str,
        sequence: u64,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<ArtifactRef, PersistenceError> {
        let name = artifact_name(display_name, sequence)?;
        let file_name = artifact_file_name(&name, mime);
        let relative = self.layout.relative_image_path(&file_name);
        let absolute = self.layout.resolve(&relative);
        let digest = content_digest(&bytes);
        let image = GeneratedImage::new(bytes, mime);

        let (local, registry) = tokio::join!(
            write_atomic(absolute.clone(), image.bytes().clone()),
            self.registry.put(&name, &image)
        );

        if local.is_ok() {
            self.remove_other_formats(&name, &file_name).await;
        }

        let kind = match (local, registry) {
            (Ok(()), Ok(())) => {
                info!(artifact = %name, path = %relative, "Saved artifact");
                let (bytes, mime) = image.dissolve();
                return ArtifactRef::builder()
                    .name(name.clone())
                    .display_name(display_name)
                    .sequence(sequence)
                    .bytes(bytes)
                    .mime(mime)
                    .path(relative)
                    .digest(digest)
                    .build()
                    .map_err(|e| {
                        PersistenceError::new(PersistenceErrorKind::InvalidName(format!(
                            "{}: {}",
                            name, e
                        )))
                    });
            }
            (Err(local), Ok(())) => PersistenceErrorKind::LocalWriteFailed {
                path: absolute.display().to_string(),
                message: local.to_string(),
                registry_written: true,
            },
            (Ok(()), Err(registry)) => PersistenceErrorKind::RegistryWriteFailed {
                artifact: name.clone(),
                local_path: absolute.display().to_string(),
                message: registry.kind.to_string(),
            },
            (Err(local), Err(registry)) => PersistenceErrorKind::BothFailed {
                local: local.to_string(),
                registry: registry.kind.to_string(),
            },
        };

        warn!(
            artifact = %name,
            local_written = kind.local_written(),
            registry_written = kind.registry_written(),
            error = %kind,
            "Artifact persisted partially or not at all"
        );
        Err(PersistenceError::new(kind))
    }

    async fn remove_other_formats(&self, name: &str, keep: &str) {
        for extension in IMAGE_EXTENSIONS {
            let file_name = format!("{}.{}", name, extension);
            if file_name == keep {
                continue;
            }
            let path = self.layout.images_dir().join(&file_name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed artifact saved in another format"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stale artifact"),
            }
        }
    }

    /// Load the image behind an artifact reference.
    ///
    /// Uses the bytes carried by the reference when present, then the local
    /// copy, then the registry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no source holds the artifact.
    #[instrument(skip(self, artifact), fields(artifact = %artifact.name()))]
    pub async fn load(&self, artifact: &ArtifactRef) -> Result<GeneratedImage, RegistryError> {
        if !artifact.bytes().is_empty() {
            return Ok(GeneratedImage::new(
                artifact.bytes().clone(),
                artifact.mime().clone(),
            ));
        }

        match tokio::fs::read(self.layout.resolve(artifact.path())).await {
            Ok(bytes) => {
                debug!("Loaded artifact from working tree");
                return Ok(GeneratedImage::new(bytes, artifact.mime().clone()));
            }
            Err(e) => debug!(error = %e, "Local copy unavailable, trying registry"),
        }

        self.registry.get(artifact.name()).await.map_err(|e| {
            if matches!(e.kind, RegistryErrorKind::NotFound(_)) {
                e
            } else {
                RegistryError::new(RegistryErrorKind::NotFound(format!(
                    "{} ({})",
                    artifact.name(),
                    e.kind
                )))
            }
        })
    }

    /// Read an image file from disk, inferring its MIME type from the extension.
    ///
    /// Relative paths resolve against the output root.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file cannot be read.
    pub async fn load_file(&self, path: &Path) -> Result<GeneratedImage, RegistryError> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.layout.resolve(path)
        };
        let bytes = tokio::fs::read(&resolved).await.map_err(|e| {
            RegistryError::new(RegistryErrorKind::NotFound(format!(
                "{}: {}",
                resolved.display(),
                e
            )))
        })?;
        let extension = resolved
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Ok(GeneratedImage::new(bytes, mime_for_extension(extension)))
    }
}
