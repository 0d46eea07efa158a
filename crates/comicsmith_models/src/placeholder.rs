//! Offline synthesizer used for dry runs.

use async_trait::async_trait;
use comicsmith_core::{GeneratedImage, PLACEHOLDER_PNG};
use comicsmith_interface::{ImageSynthesizer, SynthesisResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, instrument};

/// Returns a fixed 1x1 PNG for every call without touching the network.
///
/// Useful for exercising a comic script end to end before spending quota.
#[derive(Debug, Default)]
pub struct PlaceholderSynthesizer {
    calls: AtomicUsize,
}

impl PlaceholderSynthesizer {
    /// Creates a new placeholder synthesizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSynthesizer for PlaceholderSynthesizer {
    #[instrument(skip(self, prompt), fields(provider = "placeholder"))]
    async fn generate(&self, prompt: &str) -> SynthesisResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(prompt_len = prompt.len(), "Simulated generate");
        Ok(GeneratedImage::png(PLACEHOLDER_PNG.to_vec()))
    }

    #[instrument(skip(self, prompt, _base), fields(provider = "placeholder"))]
    async fn edit(&self, prompt: &str, _base: &GeneratedImage) -> SynthesisResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(prompt_len = prompt.len(), "Simulated edit");
        Ok(GeneratedImage::png(PLACEHOLDER_PNG.to_vec()))
    }

    fn provider_name(&self) -> &'static str {
        "placeholder"
    }

    fn model_name(&self) -> &str {
        "placeholder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_call_returns_png() {
        let synth = PlaceholderSynthesizer::new();
        let first = synth.generate("a cat").await.unwrap();
        let second = synth.edit("the cat jumps", &first).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.mime(), "image/png");
        assert_eq!(synth.calls(), 2);
    }
}
