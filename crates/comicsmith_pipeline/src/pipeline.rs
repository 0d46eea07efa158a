//! Panel scheduling, chaining and lifecycle tracking.

use crate::report::{FailureCause, PanelFailure, PanelSuccess, RunReport};
use chrono::Utc;
use comicsmith_core::{
    ArtifactRef, GeneratedImage, Ordinal, PanelOrderResolver, PanelRequest, PanelState,
    PanelTransition, PriorImage, RunContext,
};
use comicsmith_error::{PersistenceErrorKind, SynthesisErrorKind};
use comicsmith_interface::ImageSynthesizer;
use comicsmith_rate_limit::SynthesisLimiter;
use comicsmith_storage::{ArtifactStore, artifact_name, collision_key};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Default budget for one synthesizer call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Where an edit panel takes its base image from.
#[derive(Debug, Clone)]
enum BaseSource {
    /// Generate from scratch
    None,
    /// Output of an ancestor panel in this run
    Image(GeneratedImage),
    /// Artifact persisted by an earlier run
    Artifact(ArtifactRef),
    /// Image file on disk
    File(PathBuf),
}

/// Everything a panel task needs; cloned into each spawned task.
#[derive(Clone)]
struct PanelWorker {
    synthesizer: Arc<dyn ImageSynthesizer>,
    store: ArtifactStore,
    limiter: SynthesisLimiter,
    call_timeout: Duration,
    observer: Option<UnboundedSender<PanelTransition>>,
    sequence: u64,
}

/// Orchestrates synthesis, persistence and ordering for a set of panels.
///
/// Independent panels run concurrently, bounded by the limiter. A panel that
/// edits another panel of the same run is only dispatched once its ancestor
/// has been persisted, and it edits exactly the bytes the ancestor saved. A
/// failing panel never aborts its siblings; panels chained from it fail with
/// `SourceNotFound`.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = PanelPipeline::new(synthesizer, store, limiter)
///     .with_call_timeout(Duration::from_secs(60));
/// let report = pipeline.run(requests, RunContext::new(1)).await;
/// println!("{}", report);
/// ```
pub struct PanelPipeline {
    synthesizer: Arc<dyn ImageSynthesizer>,
    store: ArtifactStore,
    limiter: SynthesisLimiter,
    call_timeout: Duration,
    observer: Option<UnboundedSender<PanelTransition>>,
}

impl std::fmt::Debug for PanelPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelPipeline")
            .field("provider", &self.synthesizer.provider_name())
            .field("model", &self.synthesizer.model_name())
            .field("store", &self.store)
            .field("limiter", &self.limiter)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl PanelPipeline {
    /// Creates a pipeline with the default call timeout and no observer.
    pub fn new(
        synthesizer: Arc<dyn ImageSynthesizer>,
        store: ArtifactStore,
        limiter: SynthesisLimiter,
    ) -> Self {
        Self {
            synthesizer,
            store,
            limiter,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            observer: None,
        }
    }

    /// Sets the budget for each synthesizer call. Exceeding it is a
    /// `TransportError`.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Publishes every panel state change to `observer`.
    pub fn with_observer(mut self, observer: UnboundedSender<PanelTransition>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Artifact store used for saving panels.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run every request to a terminal state and report the outcome.
    ///
    /// Requests may arrive in any order; display order comes from each
    /// panel's description. Requests whose names map to an artifact name
    /// already claimed earlier in the batch fail with `NameCollision` before
    /// any synthesis; edits chained by a duplicated name follow the first
    /// request.
    #[instrument(
        skip(self, requests),
        fields(
            panels = requests.len(),
            sequence = *context.sequence(),
            provider = self.synthesizer.provider_name()
        )
    )]
    pub async fn run(&self, requests: Vec<PanelRequest>, context: RunContext) -> RunReport {
        let started_at = Utc::now();
        let worker = PanelWorker {
            synthesizer: self.synthesizer.clone(),
            store: self.store.clone(),
            limiter: self.limiter.clone(),
            call_timeout: self.call_timeout,
            observer: self.observer.clone(),
            sequence: *context.sequence(),
        };

        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, request) in requests.iter().enumerate() {
            index.entry(request.name().as_str()).or_insert(i);
        }

        let mut states = vec![PanelState::Pending; requests.len()];
        let mut successes: Vec<(usize, PanelSuccess)> = Vec::new();
        let mut failures: Vec<(usize, PanelFailure)> = Vec::new();
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut tasks = JoinSet::new();

        let mut claimed: HashMap<String, usize> = HashMap::new();
        let mut collided = Vec::new();
        for (i, request) in requests.iter().enumerate() {
            // Unusable names are reported by the store on save.
            let Some(key) = collision_key(request.name()) else {
                continue;
            };
            match claimed.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(first) => {
                    let kind = PersistenceErrorKind::NameCollision {
                        panel: request.name().clone(),
                        claimed_by: requests[*first.get()].name().clone(),
                        artifact: artifact_name(request.name(), worker.sequence)
                            .unwrap_or_default(),
                    };
                    warn!(panel = %request.name(), error = %kind, "Refusing panel with a colliding artifact name");
                    worker.emit(request.name(), PanelState::Pending, PanelState::Failed);
                    states[i] = PanelState::Failed;
                    failures.push((i, failure_for(request, FailureCause::Persistence(kind))));
                    collided.push(i);
                }
            }
        }

        for (i, request) in requests.iter().enumerate() {
            if states[i].is_terminal() {
                continue;
            }
            let base = match request.prior() {
                None => BaseSource::None,
                Some(PriorImage::Artifact(artifact)) => BaseSource::Artifact(artifact.clone()),
                Some(PriorImage::File(path)) => BaseSource::File(path.clone()),
                Some(PriorImage::Panel(ancestor)) => {
                    match index.get(ancestor.as_str()) {
                        Some(&parent) if parent != i => {
                            debug!(panel = %request.name(), ancestor = %ancestor, "Waiting for ancestor");
                            children.entry(parent).or_default().push(i);
                        }
                        _ => {
                            let kind = SynthesisErrorKind::SourceNotFound(format!(
                                "panel '{}' is not part of this run",
                                ancestor
                            ));
                            worker.emit(request.name(), PanelState::Pending, PanelState::Failed);
                            states[i] = PanelState::Failed;
                            failures.push((i, failure_for(request, FailureCause::Synthesis(kind))));
                        }
                    }
                    continue;
                }
            };
            // Dispatched; the task reports its own fine-grained transitions.
            states[i] = PanelState::Synthesizing;
            tasks.spawn(worker.clone().process(i, request.clone(), base));
        }

        for &i in &collided {
            fail_descendants(i, &requests, &children, &mut states, &mut failures, &worker);
        }

        while let Some(joined) = tasks.join_next().await {
            let (i, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "Panel task aborted");
                    continue;
                }
            };
            let request = &requests[i];

            match outcome {
                Ok(artifact) => {
                    let ordinal = PanelOrderResolver::classify(request.caption());
                    worker.emit(request.name(), PanelState::Persisted, PanelState::Ordered);
                    states[i] = PanelState::Ordered;
                    info!(
                        panel = %request.name(),
                        artifact = %artifact.name(),
                        ordinal = ?ordinal,
                        "Panel complete"
                    );

                    for &child in children.get(&i).map(Vec::as_slice).unwrap_or_default() {
                        let base = BaseSource::Image(GeneratedImage::new(
                            artifact.bytes().clone(),
                            artifact.mime().clone(),
                        ));
                        states[child] = PanelState::Synthesizing;
                        tasks.spawn(worker.clone().process(child, requests[child].clone(), base));
                    }

                    successes.push((
                        i,
                        PanelSuccess::new(request.name().clone(), request.caption(), artifact, ordinal),
                    ));
                }
                Err(cause) => {
                    warn!(
                        panel = %request.name(),
                        family = cause.family(),
                        kind = cause.kind_name(),
                        error = %cause,
                        "Panel failed"
                    );
                    states[i] = PanelState::Failed;
                    failures.push((i, failure_for(request, cause)));
                    fail_descendants(i, &requests, &children, &mut states, &mut failures, &worker);
                }
            }
        }

        // Anything still open either sits in an edit cycle or lost its task.
        for (i, request) in requests.iter().enumerate() {
            let state = states[i];
            if state.is_terminal() {
                continue;
            }
            let kind = if state.is_pending() {
                SynthesisErrorKind::SourceNotFound(format!(
                    "edit chain of '{}' never became ready",
                    request.name()
                ))
            } else {
                SynthesisErrorKind::transport("panel task aborted")
            };
            let from = if state.is_pending() {
                PanelState::Pending
            } else {
                PanelState::Synthesizing
            };
            worker.emit(request.name(), from, PanelState::Failed);
            states[i] = PanelState::Failed;
            failures.push((i, failure_for(request, FailureCause::Synthesis(kind))));
        }

        successes.sort_by_key(|(i, success)| (ordinal_key(success.ordinal()), *i));
        failures.sort_by_key(|(i, _)| *i);

        let report = RunReport::new(
            *context.sequence(),
            started_at,
            successes.into_iter().map(|(_, s)| s).collect(),
            failures.into_iter().map(|(_, f)| f).collect(),
        );
        info!(
            succeeded = report.successes().len(),
            failed = report.failures().len(),
            fallbacks = report.fallbacks().len(),
            "Run finished"
        );
        report
    }
}

impl PanelWorker {
    fn emit(&self, panel: &str, from: PanelState, to: PanelState) {
        debug_assert!(from.can_transition_to(to), "illegal transition {} -> {}", from, to);
        debug!(panel, from = %from, to = %to, "Panel transition");
        if let Some(observer) = &self.observer {
            // A dropped receiver only means nobody is listening.
            let _ = observer.send(PanelTransition::new(panel, from, to));
        }
    }

    /// Drive one panel from `Pending` to `Persisted`.
    async fn process(
        self,
        index: usize,
        request: PanelRequest,
        base: BaseSource,
    ) -> (usize, Result<ArtifactRef, FailureCause>) {
        let name = request.name().as_str();

        let _guard = match self.limiter.acquire().await {
            Ok(guard) => guard,
            Err(e) => {
                self.emit(name, PanelState::Pending, PanelState::Failed);
                return (
                    index,
                    Err(FailureCause::Synthesis(SynthesisErrorKind::transport(
                        e.to_string(),
                    ))),
                );
            }
        };
        self.emit(name, PanelState::Pending, PanelState::Synthesizing);

        let image = match self.synthesize(&request, base).await {
            Ok(image) => image,
            Err(kind) => {
                self.emit(name, PanelState::Synthesizing, PanelState::Failed);
                return (index, Err(FailureCause::Synthesis(kind)));
            }
        };

        let (bytes, mime) = image.dissolve();
        match self.store.save(name, self.sequence, bytes, &mime).await {
            Ok(artifact) => {
                self.emit(name, PanelState::Synthesizing, PanelState::Persisted);
                (index, Ok(artifact))
            }
            Err(e) => {
                self.emit(name, PanelState::Synthesizing, PanelState::Failed);
                (index, Err(FailureCause::Persistence(e.kind)))
            }
        }
    }

    #[instrument(skip(self, request, base), fields(panel = %request.name(), edit = request.is_edit()))]
    async fn synthesize(
        &self,
        request: &PanelRequest,
        base: BaseSource,
    ) -> Result<GeneratedImage, SynthesisErrorKind> {
        let base = match base {
            BaseSource::None => None,
            BaseSource::Image(image) => Some(image),
            BaseSource::Artifact(artifact) => Some(
                self.store
                    .load(&artifact)
                    .await
                    .map_err(|e| SynthesisErrorKind::SourceNotFound(e.kind.to_string()))?,
            ),
            BaseSource::File(path) => Some(
                self.store
                    .load_file(&path)
                    .await
                    .map_err(|e| SynthesisErrorKind::SourceNotFound(e.kind.to_string()))?,
            ),
        };

        let call = async {
            match &base {
                Some(base) => self.synthesizer.edit(request.prompt(), base).await,
                None => self.synthesizer.generate(request.prompt()).await,
            }
        };

        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(image)) => Ok(image),
            Ok(Err(e)) => Err(e.kind),
            Err(_) => Err(SynthesisErrorKind::transport(format!(
                "synthesis timed out after {:?}",
                self.call_timeout
            ))),
        }
    }
}

fn failure_for(request: &PanelRequest, cause: FailureCause) -> PanelFailure {
    PanelFailure::new(request.name().clone(), request.caption(), cause)
}

fn ordinal_key(ordinal: &Ordinal) -> u64 {
    match ordinal {
        Ordinal::Parsed(n) => *n,
        _ => comicsmith_core::SENTINEL_ORDINAL,
    }
}

/// Fail every panel chained, directly or transitively, from `root`.
fn fail_descendants(
    root: usize,
    requests: &[PanelRequest],
    children: &HashMap<usize, Vec<usize>>,
    states: &mut [PanelState],
    failures: &mut Vec<(usize, PanelFailure)>,
    worker: &PanelWorker,
) {
    let mut stack: Vec<usize> = children.get(&root).cloned().unwrap_or_default();
    while let Some(child) = stack.pop() {
        if !states[child].is_pending() {
            continue;
        }
        let ancestor = requests[child].ancestor().unwrap_or_default();
        let kind = SynthesisErrorKind::SourceNotFound(format!(
            "ancestor panel '{}' failed",
            ancestor
        ));
        worker.emit(requests[child].name(), PanelState::Pending, PanelState::Failed);
        warn!(panel = %requests[child].name(), ancestor, "Skipping panel chained from a failed panel");
        states[child] = PanelState::Failed;
        failures.push((child, failure_for(&requests[child], FailureCause::Synthesis(kind))));
        if let Some(grandchildren) = children.get(&child) {
            stack.extend(grandchildren.iter().copied());
        }
    }
}
