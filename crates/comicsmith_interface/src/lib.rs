//! Trait definitions for the Comicsmith panel pipeline.
//!
//! The pipeline talks to the outside world through two seams: an
//! [`ImageSynthesizer`] that turns prompts into images and an
//! [`ArtifactRegistry`] that keeps a durable copy of every saved artifact.

mod registry;
mod synthesizer;

pub use registry::ArtifactRegistry;
pub use synthesizer::{ImageSynthesizer, SynthesisResult};
