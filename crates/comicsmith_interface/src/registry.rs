//! Durable artifact registry.

use async_trait::async_trait;
use comicsmith_core::GeneratedImage;
use comicsmith_error::RegistryError;

/// External store that keeps every artifact under its artifact name.
///
/// Writing the same name twice replaces the earlier content.
#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// Store an image under `name`, replacing any previous content.
    async fn put(&self, name: &str, image: &GeneratedImage) -> Result<(), RegistryError>;

    /// Fetch the image stored under `name`.
    async fn get(&self, name: &str) -> Result<GeneratedImage, RegistryError>;

    /// Names of all stored artifacts, sorted.
    async fn list(&self) -> Result<Vec<String>, RegistryError>;

    /// Human-readable registry name, used in logs.
    fn registry_name(&self) -> &str;
}
