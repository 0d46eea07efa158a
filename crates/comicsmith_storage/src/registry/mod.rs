//! Durable artifact registries.

mod filesystem;
mod memory;

pub use filesystem::FilesystemArtifactRegistry;
pub use memory::InMemoryArtifactRegistry;
