//! Image model integrations for Comicsmith.
//!
//! Provides the Vertex AI client used for real runs and a placeholder
//! synthesizer for dry runs, both behind
//! [`comicsmith_interface::ImageSynthesizer`].

mod config;
mod placeholder;
pub mod vertex;

pub use config::{
    AspectRatio, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS, ENV_ACCESS_TOKEN, ENV_ASPECT_RATIO,
    ENV_LOCATION, ENV_MAX_CONCURRENT, ENV_MAX_RETRIES, ENV_MODEL, ENV_PERSON_GENERATION,
    ENV_PROJECT, ENV_REQUESTS_PER_MINUTE, ENV_SAFETY_FILTER, ENV_TIMEOUT_SECS, PersonGeneration,
    SafetyFilterLevel, SynthesisConfig, SynthesisConfigBuilder,
};
pub use placeholder::PlaceholderSynthesizer;
pub use vertex::VertexImageClient;
