//! Image synthesis capability boundary.

use async_trait::async_trait;
use comicsmith_core::GeneratedImage;
use comicsmith_error::SynthesisError;

/// Result of a single synthesis call.
///
/// Failures carry a [`comicsmith_error::SynthesisErrorKind`]: `Rejected`,
/// `NoResult`, `TransportError` or `SourceNotFound`.
pub type SynthesisResult = Result<GeneratedImage, SynthesisError>;

/// An external image generator.
///
/// Implementations make exactly one remote call per method and keep no state
/// the pipeline depends on. The pipeline picks `generate` or `edit` once per
/// panel and never retries a failed call with the other mode.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use comicsmith_core::GeneratedImage;
/// use comicsmith_interface::{ImageSynthesizer, SynthesisResult};
///
/// struct Solid;
///
/// #[async_trait]
/// impl ImageSynthesizer for Solid {
///     async fn generate(&self, _prompt: &str) -> SynthesisResult {
///         Ok(GeneratedImage::png(vec![0; 8]))
///     }
///
///     async fn edit(&self, _prompt: &str, base: &GeneratedImage) -> SynthesisResult {
///         Ok(base.clone())
///     }
///
///     fn provider_name(&self) -> &'static str {
///         "solid"
///     }
///
///     fn model_name(&self) -> &str {
///         "solid-v1"
///     }
/// }
/// ```
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Produce a new image from a prompt.
    async fn generate(&self, prompt: &str) -> SynthesisResult;

    /// Modify `base` according to a prompt.
    async fn edit(&self, prompt: &str, base: &GeneratedImage) -> SynthesisResult;

    /// Provider name, for logs and reports.
    fn provider_name(&self) -> &'static str;

    /// Model identifier, for logs and reports.
    fn model_name(&self) -> &str;
}
