//! Panel pipeline for Comicsmith.
//!
//! [`PanelPipeline`] turns a set of [`PanelRequest`]s into persisted
//! artifacts: it decides per panel whether to generate or edit, dispatches
//! independent panels concurrently, holds chained edits until their ancestor
//! is persisted, and resolves each panel's display ordinal. The outcome of a
//! run is a [`RunReport`].
//!
//! Panel requests usually come from a TOML [`ComicScript`].
//!
//! [`PanelRequest`]: comicsmith_core::PanelRequest

mod pipeline;
mod report;
mod script;

pub use pipeline::{DEFAULT_CALL_TIMEOUT, PanelPipeline};
pub use report::{FailureCause, PanelFailure, PanelSuccess, RunReport};
pub use script::{ComicMeta, ComicScript, PanelSpec};
