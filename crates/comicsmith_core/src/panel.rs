//! Panel requests submitted to the pipeline.

use crate::ArtifactRef;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image a panel edits instead of generating from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PriorImage {
    /// An artifact persisted by an earlier run
    Artifact(ArtifactRef),
    /// The output of another panel in the same run, by display name
    Panel(String),
    /// An image file already on disk
    File(PathBuf),
}

/// One panel to synthesize.
///
/// Immutable once built; the pipeline only reads it. Panels without a
/// `prior` are generated, panels with one are edited.
///
/// # Examples
///
/// ```
/// use comicsmith_core::{PanelRequest, PriorImage};
///
/// let first = PanelRequest::builder()
///     .name("panel_1")
///     .prompt("A lighthouse at dusk")
///     .description("Panel 1: The lighthouse")
///     .build()
///     .unwrap();
/// assert!(!first.is_edit());
///
/// let second = PanelRequest::builder()
///     .name("panel_2")
///     .prompt("Same lighthouse, now in a storm")
///     .description("Panel 2: The storm")
///     .prior(PriorImage::Panel("panel_1".to_string()))
///     .build()
///     .unwrap();
/// assert_eq!(second.ancestor(), Some("panel_1"));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PanelRequest {
    /// Display name, also the stem of the artifact name
    name: String,
    /// Prompt sent to the synthesizer
    prompt: String,
    /// Caption text; its leading number decides display order
    #[builder(default)]
    description: String,
    /// Image to edit, if any
    #[builder(default, setter(strip_option))]
    prior: Option<PriorImage>,
}

impl PanelRequestBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.name {
            Some(name) if name.trim().is_empty() => Err("panel name cannot be empty".to_string()),
            _ => Ok(()),
        }
    }
}

impl PanelRequest {
    /// Returns a builder for constructing a PanelRequest.
    pub fn builder() -> PanelRequestBuilder {
        PanelRequestBuilder::default()
    }

    /// Whether this panel edits an existing image.
    pub fn is_edit(&self) -> bool {
        self.prior.is_some()
    }

    /// Name of the in-run panel this panel is chained from.
    pub fn ancestor(&self) -> Option<&str> {
        match &self.prior {
            Some(PriorImage::Panel(name)) => Some(name),
            _ => None,
        }
    }

    /// Caption text, falling back to the prompt when none was given.
    pub fn caption(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.prompt
        } else {
            &self.description
        }
    }
}
