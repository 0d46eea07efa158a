//! Core data types for the Comicsmith panel pipeline.
//!
//! This crate holds the data model shared by every stage: panel requests,
//! persisted artifacts, panel records and the ordering rule that turns loose
//! caption text into display order.

mod artifact;
mod media;
mod order;
mod panel;
mod record;
mod run;

pub use artifact::{ArtifactRef, ArtifactRefBuilder};
pub use media::{
    DEFAULT_IMAGE_MIME, GeneratedImage, IMAGE_EXTENSIONS, PLACEHOLDER_PNG, extension_for_mime,
    mime_for_extension,
};
pub use order::{PanelOrderResolver, SENTINEL_ORDINAL};
pub use panel::{PanelRequest, PanelRequestBuilder, PriorImage};
pub use record::{Comic, ImageRef, Ordinal, PanelRecord};
pub use run::{PanelState, PanelTransition, RunContext};
