//! Error types for the Comicsmith panel pipeline.
//!
//! Failures are split into families that the run report keeps apart:
//! configuration problems abort a run before any work starts, while
//! synthesis and persistence failures are recorded per panel.

mod config;
mod persistence;
mod registry;
mod render;
mod script;
mod synthesis;

pub use config::ConfigError;
pub use persistence::{PersistenceError, PersistenceErrorKind};
pub use registry::{RegistryError, RegistryErrorKind};
pub use render::RenderError;
pub use script::{ScriptError, ScriptErrorKind};
pub use synthesis::{RetryableError, SynthesisError, SynthesisErrorKind};

/// Crate-level error variants.
#[derive(Debug, derive_more::From)]
pub enum ComicsmithErrorKind {
    /// Missing or invalid run configuration
    Config(ConfigError),
    /// Comic script could not be loaded or failed validation
    Script(ScriptError),
    /// Image synthesis failed
    Synthesis(SynthesisError),
    /// Artifact persistence failed in one or both sinks
    Persistence(PersistenceError),
    /// Durable registry operation failed
    Registry(RegistryError),
    /// Document could not be rendered or written
    Render(RenderError),
}

impl std::fmt::Display for ComicsmithErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComicsmithErrorKind::Config(e) => write!(f, "{}", e),
            ComicsmithErrorKind::Script(e) => write!(f, "{}", e),
            ComicsmithErrorKind::Synthesis(e) => write!(f, "{}", e),
            ComicsmithErrorKind::Persistence(e) => write!(f, "{}", e),
            ComicsmithErrorKind::Registry(e) => write!(f, "{}", e),
            ComicsmithErrorKind::Render(e) => write!(f, "{}", e),
        }
    }
}

/// Comicsmith error with kind discrimination.
#[derive(Debug)]
pub struct ComicsmithError(Box<ComicsmithErrorKind>);

impl ComicsmithError {
    /// Create a new error from a kind.
    pub fn new(kind: ComicsmithErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ComicsmithErrorKind {
        &self.0
    }
}

impl std::fmt::Display for ComicsmithError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Comicsmith Error: {}", self.0)
    }
}

impl std::error::Error for ComicsmithError {}

// Generic From implementation for any type that converts to ComicsmithErrorKind
impl<T> From<T> for ComicsmithError
where
    T: Into<ComicsmithErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Comicsmith operations.
pub type ComicsmithResult<T> = std::result::Result<T, ComicsmithError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_into_crate_error() {
        fn fails() -> ComicsmithResult<()> {
            Err(ConfigError::new("IMAGEN_MODEL is not set").into())
        }

        let err = fails().unwrap_err();
        assert!(matches!(err.kind(), ComicsmithErrorKind::Config(_)));
        assert!(err.to_string().contains("IMAGEN_MODEL"));
    }

    #[test]
    fn test_location_is_recorded() {
        let err = ScriptError::new(ScriptErrorKind::NoPanels);
        assert!(err.file.ends_with("lib.rs"));
        assert!(err.line > 0);
    }
}
