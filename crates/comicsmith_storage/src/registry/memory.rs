//! Process-local registry for tests and dry runs.

use async_trait::async_trait;
use comicsmith_core::GeneratedImage;
use comicsmith_error::{RegistryError, RegistryErrorKind};
use comicsmith_interface::ArtifactRegistry;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Registry that keeps artifacts in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryArtifactRegistry {
    artifacts: RwLock<HashMap<String, GeneratedImage>>,
}

impl InMemoryArtifactRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.artifacts.read().await.is_empty()
    }
}

#[async_trait]
impl ArtifactRegistry for InMemoryArtifactRegistry {
    #[instrument(skip(self, image), fields(size = image.bytes().len()))]
    async fn put(&self, name: &str, image: &GeneratedImage) -> Result<(), RegistryError> {
        let replaced = self
            .artifacts
            .write()
            .await
            .insert(name.to_string(), image.clone())
            .is_some();
        debug!(replaced, "Stored artifact in memory");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<GeneratedImage, RegistryError> {
        self.artifacts
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::new(RegistryErrorKind::NotFound(name.to_string())))
    }

    async fn list(&self) -> Result<Vec<String>, RegistryError> {
        let mut names: Vec<String> = self.artifacts.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn registry_name(&self) -> &str {
        "memory"
    }
}
