//! Comicsmith: comic panels from image models, assembled into one page.
//!
//! A run reads a TOML comic script, synthesizes each panel (generating it, or
//! editing an earlier panel's output), persists every image under a
//! versioned artifact name, and renders the surviving panels, ordered by the
//! number in their captions, into `comic.html`.
//!
//! This crate re-exports the workspace crates and provides the high-level
//! flows behind the `comicsmith` binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use comicsmith::{RunOptions, run_comic};
//!
//! let options = RunOptions::builder()
//!     .script("heist.toml")
//!     .out("output")
//!     .dry_run(true)
//!     .build()?;
//! let outcome = run_comic(&options, None).await?;
//! println!("{}", outcome.report());
//! ```

mod runner;

pub use runner::{RunOptions, RunOptionsBuilder, RunOutcome, render_manifest, run_comic};

pub use comicsmith_core::{
    ArtifactRef, Comic, GeneratedImage, ImageRef, Ordinal, PanelOrderResolver, PanelRecord,
    PanelRequest, PanelState, PanelTransition, PriorImage, RunContext, SENTINEL_ORDINAL,
};
pub use comicsmith_error::{
    ComicsmithError, ComicsmithErrorKind, ComicsmithResult, ConfigError, PersistenceError,
    PersistenceErrorKind, RegistryError, RenderError, ScriptError, ScriptErrorKind,
    SynthesisError, SynthesisErrorKind,
};
pub use comicsmith_interface::{ArtifactRegistry, ImageSynthesizer, SynthesisResult};
pub use comicsmith_models::{
    AspectRatio, PersonGeneration, PlaceholderSynthesizer, SafetyFilterLevel, SynthesisConfig,
    VertexImageClient,
};
pub use comicsmith_pipeline::{
    ComicScript, FailureCause, PanelFailure, PanelPipeline, PanelSuccess, RunReport,
};
pub use comicsmith_rate_limit::{SynthesisLimiter, SynthesisLimits};
pub use comicsmith_render::{DocumentAssembler, FailedPanelPolicy};
pub use comicsmith_storage::{
    ArtifactStore, FilesystemArtifactRegistry, InMemoryArtifactRegistry, OutputLayout,
};
