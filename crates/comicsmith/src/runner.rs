//! End-to-end flows: run a comic script, re-render a manifest.

use comicsmith_core::{PanelRecord, RunContext};
use comicsmith_error::{ComicsmithResult, ConfigError};
use comicsmith_interface::{ArtifactRegistry, ImageSynthesizer};
use comicsmith_models::{PlaceholderSynthesizer, SynthesisConfig, VertexImageClient};
use comicsmith_pipeline::{ComicScript, DEFAULT_CALL_TIMEOUT, PanelPipeline, RunReport};
use comicsmith_rate_limit::{SynthesisLimiter, SynthesisLimits};
use comicsmith_render::{DocumentAssembler, FailedPanelPolicy, MANIFEST_FILE, write_manifest};
use comicsmith_storage::{
    ArtifactStore, FilesystemArtifactRegistry, InMemoryArtifactRegistry, OutputLayout,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Options for one comic run.
#[derive(Debug, Clone, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct RunOptions {
    /// Comic script to run
    script: PathBuf,
    /// Output root; receives `comic.html`, `manifest.json` and `images/`
    #[builder(default = "PathBuf::from(\"output\")")]
    out: PathBuf,
    /// Run sequence for artifact names (`None` = current Unix time)
    #[builder(default)]
    sequence: Option<u64>,
    /// Use the placeholder synthesizer instead of a real model
    #[builder(default)]
    dry_run: bool,
    /// Treatment of failed panels in the document
    #[builder(default)]
    failed_panels: FailedPanelPolicy,
    /// Durable registry directory (`None` = `<out>/registry`)
    #[builder(default)]
    registry_dir: Option<PathBuf>,
}

impl RunOptions {
    /// Returns a builder for constructing RunOptions.
    pub fn builder() -> RunOptionsBuilder {
        RunOptionsBuilder::default()
    }
}

/// What a run produced.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct RunOutcome {
    /// Per-panel results
    report: RunReport,
    /// Path of the written document
    document: PathBuf,
}

/// Run a comic script end to end and write the document.
///
/// Per-panel failures do not fail the run; they are listed in the report.
/// `config` is required unless `options.dry_run()` is set.
///
/// # Errors
///
/// Returns an error if the script is invalid, configuration is missing, or
/// the document cannot be written.
#[instrument(skip_all, fields(script = %options.script().display(), dry_run = options.dry_run()))]
pub async fn run_comic(
    options: &RunOptions,
    config: Option<SynthesisConfig>,
) -> ComicsmithResult<RunOutcome> {
    let script = ComicScript::from_file(options.script())?;
    let requests = script.to_requests()?;

    let (synthesizer, limits, timeout) = match (options.dry_run, config) {
        (true, _) => {
            info!("Dry run: using placeholder images");
            (
                Arc::new(PlaceholderSynthesizer::new()) as Arc<dyn ImageSynthesizer>,
                SynthesisLimits::default(),
                DEFAULT_CALL_TIMEOUT,
            )
        }
        (false, Some(config)) => {
            let limits = config.limits().clone();
            let timeout = *config.timeout();
            let client =
                Arc::new(VertexImageClient::new(config)?) as Arc<dyn ImageSynthesizer>;
            (client, limits, timeout)
        }
        (false, None) => {
            return Err(ConfigError::new(
                "Synthesis configuration is required unless running with --dry-run",
            )
            .into());
        }
    };

    let limiter = SynthesisLimiter::new(&limits).map_err(|e| ConfigError::new(e.to_string()))?;
    let layout = OutputLayout::new(options.out.clone());
    let registry: Arc<dyn ArtifactRegistry> = match (&options.registry_dir, options.dry_run) {
        (Some(dir), _) => Arc::new(FilesystemArtifactRegistry::new(dir.clone())),
        (None, true) => Arc::new(InMemoryArtifactRegistry::new()),
        (None, false) => Arc::new(FilesystemArtifactRegistry::new(
            options.out.join("registry"),
        )),
    };
    let store = ArtifactStore::new(layout.clone(), registry);

    let sequence = options
        .sequence
        .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);
    let pipeline = PanelPipeline::new(synthesizer, store, limiter).with_call_timeout(timeout);
    let report = pipeline.run(requests, RunContext::new(sequence)).await;

    let assembler = DocumentAssembler::new(options.failed_panels);
    let failed: Vec<String> = report
        .failures()
        .iter()
        .map(|f| f.description().clone())
        .collect();
    let comic = assembler.assemble(
        script.title(),
        report.records(),
        &failed,
        &layout.placeholder_relative_path(),
    );

    let document = assembler.write(&layout, &comic)?;
    write_manifest(layout.root().join(MANIFEST_FILE), comic.panels())?;

    if !report.is_success() {
        warn!(failed = report.failures().len(), "Run finished with failed panels");
    }
    Ok(RunOutcome { report, document })
}

/// Render a document from a manifest without any synthesis.
///
/// Image paths resolve against `out`. Entries with an empty or missing image
/// fail the render under [`FailedPanelPolicy::Omit`] and are shown with the
/// placeholder under [`FailedPanelPolicy::Placeholder`].
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, an image is unusable
/// under `Omit`, or the document cannot be written.
#[instrument(skip_all, fields(manifest = %manifest.display(), out = %out.display(), policy = %policy))]
pub fn render_manifest(
    manifest: &Path,
    title: &str,
    out: &Path,
    policy: FailedPanelPolicy,
) -> ComicsmithResult<PathBuf> {
    let records: Vec<PanelRecord> = comicsmith_render::read_manifest(manifest)?;
    let layout = OutputLayout::new(out);
    let assembler = DocumentAssembler::new(policy);
    let (present, failed) = assembler.check_images(&layout, records)?;
    let comic = assembler.assemble(title, present, &failed, &layout.placeholder_relative_path());
    Ok(assembler.write(&layout, &comic)?)
}
