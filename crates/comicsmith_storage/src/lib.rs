//! Artifact persistence for Comicsmith.
//!
//! Every generated image is written twice: into the working tree, where the
//! rendered document references it, and into a durable [`ArtifactRegistry`]
//! keyed by the same artifact name.
//!
//! [`ArtifactRegistry`]: comicsmith_interface::ArtifactRegistry

mod atomic;
mod layout;
mod naming;
mod registry;
mod store;

pub use atomic::{write_atomic, write_atomic_blocking};
pub use layout::{DOCUMENT_FILE, IMAGES_DIR, OutputLayout, PLACEHOLDER_FILE};
pub use naming::{
    artifact_file_name, artifact_name, collision_key, content_digest, sanitize_name,
};
pub use registry::{FilesystemArtifactRegistry, InMemoryArtifactRegistry};
pub use store::ArtifactStore;
