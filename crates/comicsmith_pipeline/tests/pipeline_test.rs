//! End-to-end pipeline runs against scripted synthesizers.

use async_trait::async_trait;
use comicsmith_core::{
    GeneratedImage, Ordinal, PanelRequest, PanelState, PanelTransition, PriorImage, RunContext,
};
use comicsmith_error::{RegistryError, RegistryErrorKind, SynthesisError, SynthesisErrorKind};
use comicsmith_interface::{ArtifactRegistry, ImageSynthesizer, SynthesisResult};
use comicsmith_pipeline::{FailureCause, PanelPipeline};
use comicsmith_rate_limit::{SynthesisLimiter, SynthesisLimits};
use comicsmith_storage::{ArtifactStore, InMemoryArtifactRegistry, OutputLayout};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
enum Behavior {
    Image(Vec<u8>),
    Fail(SynthesisErrorKind),
    Hang,
}

#[derive(Debug, Clone)]
struct Call {
    prompt: String,
    base: Option<Vec<u8>>,
    images_on_disk: Vec<String>,
}

/// Synthesizer whose answer depends on the prompt.
struct ScriptedSynthesizer {
    behaviors: HashMap<String, Behavior>,
    images_dir: PathBuf,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedSynthesizer {
    fn new(images_dir: &Path, behaviors: &[(&str, Behavior)]) -> Self {
        Self {
            behaviors: behaviors
                .iter()
                .map(|(prompt, b)| (prompt.to_string(), b.clone()))
                .collect(),
            images_dir: images_dir.to_path_buf(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, prompt: &str, base: Option<&GeneratedImage>) -> SynthesisResult {
        let mut images_on_disk: Vec<String> = std::fs::read_dir(&self.images_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        images_on_disk.sort();
        self.calls.lock().unwrap().push(Call {
            prompt: prompt.to_string(),
            base: base.map(|b| b.bytes().clone()),
            images_on_disk,
        });

        match self.behaviors.get(prompt) {
            Some(Behavior::Image(bytes)) => Ok(GeneratedImage::png(bytes.clone())),
            Some(Behavior::Fail(kind)) => Err(SynthesisError::new(kind.clone())),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(GeneratedImage::png(vec![0]))
            }
            None => Err(SynthesisError::new(SynthesisErrorKind::NoResult(
                "unscripted prompt".to_string(),
            ))),
        }
    }
}

#[async_trait]
impl ImageSynthesizer for ScriptedSynthesizer {
    async fn generate(&self, prompt: &str) -> SynthesisResult {
        self.answer(prompt, None).await
    }

    async fn edit(&self, prompt: &str, base: &GeneratedImage) -> SynthesisResult {
        self.answer(prompt, Some(base)).await
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-v1"
    }
}

/// Registry that rejects every write.
struct OfflineRegistry;

#[async_trait]
impl ArtifactRegistry for OfflineRegistry {
    async fn put(&self, _name: &str, _image: &GeneratedImage) -> Result<(), RegistryError> {
        Err(RegistryError::new(RegistryErrorKind::Unavailable(
            "offline".to_string(),
        )))
    }

    async fn get(&self, name: &str) -> Result<GeneratedImage, RegistryError> {
        Err(RegistryError::new(RegistryErrorKind::NotFound(name.to_string())))
    }

    async fn list(&self) -> Result<Vec<String>, RegistryError> {
        Ok(Vec::new())
    }

    fn registry_name(&self) -> &str {
        "offline"
    }
}

fn request(name: &str, description: &str, prompt: &str) -> PanelRequest {
    PanelRequest::builder()
        .name(name)
        .description(description)
        .prompt(prompt)
        .build()
        .unwrap()
}

fn edit_request(name: &str, description: &str, prompt: &str, prior: PriorImage) -> PanelRequest {
    PanelRequest::builder()
        .name(name)
        .description(description)
        .prompt(prompt)
        .prior(prior)
        .build()
        .unwrap()
}

fn pipeline_with(
    dir: &TempDir,
    synthesizer: Arc<ScriptedSynthesizer>,
    registry: Arc<dyn ArtifactRegistry>,
) -> PanelPipeline {
    let store = ArtifactStore::new(OutputLayout::new(dir.path()), registry);
    let limiter = SynthesisLimiter::new(&SynthesisLimits::unthrottled(4)).unwrap();
    PanelPipeline::new(synthesizer, store, limiter)
}

#[tokio::test]
async fn test_chained_edit_waits_for_ancestor() {
    let dir = TempDir::new().unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[
            ("a lighthouse", Behavior::Image(vec![1, 1])),
            ("add a storm", Behavior::Image(vec![2, 2])),
            ("a gull", Behavior::Image(vec![3, 3])),
        ],
    ));
    let pipeline = pipeline_with(&dir, synth.clone(), Arc::new(InMemoryArtifactRegistry::new()));

    // Supplied out of display order on purpose.
    let requests = vec![
        request("gull", "Panel 3: A gull", "a gull"),
        edit_request(
            "storm",
            "Panel 2: The storm",
            "add a storm",
            PriorImage::Panel("lighthouse".to_string()),
        ),
        request("lighthouse", "Panel 1: The lighthouse", "a lighthouse"),
    ];

    let report = pipeline.run(requests, RunContext::new(7)).await;

    assert!(report.is_success(), "{}", report);
    let names: Vec<&str> = report.successes().iter().map(|s| s.name().as_str()).collect();
    assert_eq!(names, vec!["lighthouse", "storm", "gull"]);

    let calls = synth.calls();
    let edit = calls.iter().find(|c| c.prompt == "add a storm").unwrap();
    assert_eq!(edit.base, Some(vec![1, 1]));
    assert!(edit.images_on_disk.contains(&"lighthouse_7.png".to_string()));
    assert!(calls.iter().filter(|c| c.prompt != "add a storm").all(|c| c.base.is_none()));

    let storm = report.success("storm").unwrap();
    assert_eq!(storm.artifact().path(), "images/storm_7.png");
    assert_eq!(*storm.ordinal(), Ordinal::Parsed(2));
    assert_eq!(
        std::fs::read(dir.path().join("images/storm_7.png")).unwrap(),
        vec![2, 2]
    );
}

#[tokio::test]
async fn test_rejected_panel_does_not_abort_siblings() {
    let dir = TempDir::new().unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[
            ("one", Behavior::Image(vec![1])),
            (
                "two",
                Behavior::Fail(SynthesisErrorKind::Rejected("SAFETY".to_string())),
            ),
            ("three", Behavior::Image(vec![3])),
        ],
    ));
    let pipeline = pipeline_with(&dir, synth, Arc::new(InMemoryArtifactRegistry::new()));

    let report = pipeline
        .run(
            vec![
                request("p1", "Panel 1: one", "one"),
                request("p2", "Panel 2: two", "two"),
                request("p3", "Panel 3: three", "three"),
            ],
            RunContext::new(0),
        )
        .await;

    assert_eq!(report.successes().len(), 2);
    assert_eq!(report.failures().len(), 1);
    let failure = report.failure("p2").unwrap();
    assert_eq!(
        failure.cause(),
        &FailureCause::Synthesis(SynthesisErrorKind::Rejected("SAFETY".to_string()))
    );
    assert_eq!(failure.kind(), "rejected");

    let records = report.records();
    let paths: Vec<&str> = records.iter().map(|r| r.image_ref().relative_path()).collect();
    assert_eq!(paths, vec!["images/p1_0.png", "images/p3_0.png"]);
}

#[tokio::test]
async fn test_failed_ancestor_fails_whole_chain() {
    let dir = TempDir::new().unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[
            ("root", Behavior::Fail(SynthesisErrorKind::NoResult("empty".to_string()))),
            ("child", Behavior::Image(vec![2])),
            ("grandchild", Behavior::Image(vec![3])),
        ],
    ));
    let pipeline = pipeline_with(&dir, synth.clone(), Arc::new(InMemoryArtifactRegistry::new()));

    let report = pipeline
        .run(
            vec![
                request("a", "Panel 1: root", "root"),
                edit_request("b", "Panel 2: child", "child", PriorImage::Panel("a".into())),
                edit_request("c", "Panel 3: grandchild", "grandchild", PriorImage::Panel("b".into())),
            ],
            RunContext::new(1),
        )
        .await;

    assert!(report.successes().is_empty());
    let kinds: Vec<&str> = report.failures().iter().map(|f| f.kind().as_str()).collect();
    assert_eq!(kinds, vec!["no_result", "source_not_found", "source_not_found"]);
    assert_eq!(synth.calls().len(), 1);
}

#[tokio::test]
async fn test_unknown_ancestor_is_source_not_found() {
    let dir = TempDir::new().unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[("x", Behavior::Image(vec![1]))],
    ));
    let pipeline = pipeline_with(&dir, synth, Arc::new(InMemoryArtifactRegistry::new()));

    let report = pipeline
        .run(
            vec![edit_request("b", "Panel 1: x", "x", PriorImage::Panel("ghost".into()))],
            RunContext::new(0),
        )
        .await;

    assert!(matches!(
        report.failure("b").unwrap().cause(),
        FailureCause::Synthesis(SynthesisErrorKind::SourceNotFound(_))
    ));
}

#[tokio::test]
async fn test_edit_from_file_on_disk() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("old.png"), [9, 9, 9]).unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[
            ("recolor", Behavior::Image(vec![4])),
            ("recolor missing", Behavior::Image(vec![5])),
        ],
    ));
    let pipeline = pipeline_with(&dir, synth.clone(), Arc::new(InMemoryArtifactRegistry::new()));

    let report = pipeline
        .run(
            vec![
                edit_request(
                    "found",
                    "Panel 1: found",
                    "recolor",
                    PriorImage::File(PathBuf::from("old.png")),
                ),
                edit_request(
                    "missing",
                    "Panel 2: missing",
                    "recolor missing",
                    PriorImage::File(dir.path().join("nope.png")),
                ),
            ],
            RunContext::new(0),
        )
        .await;

    assert!(report.success("found").is_some());
    assert_eq!(report.failure("missing").unwrap().kind(), "source_not_found");
    let calls = synth.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].base, Some(vec![9, 9, 9]));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let dir = TempDir::new().unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[("slow", Behavior::Hang), ("fast", Behavior::Image(vec![1]))],
    ));
    let pipeline = pipeline_with(&dir, synth, Arc::new(InMemoryArtifactRegistry::new()))
        .with_call_timeout(Duration::from_millis(50));

    let report = pipeline
        .run(
            vec![
                request("slow", "Panel 1: slow", "slow"),
                request("fast", "Panel 2: fast", "fast"),
            ],
            RunContext::new(0),
        )
        .await;

    assert!(report.success("fast").is_some());
    assert!(matches!(
        report.failure("slow").unwrap().cause(),
        FailureCause::Synthesis(SynthesisErrorKind::TransportError {
            status_code: None,
            ..
        })
    ));
}

#[tokio::test]
async fn test_persistence_failure_is_distinct_from_synthesis() {
    let dir = TempDir::new().unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[("one", Behavior::Image(vec![1]))],
    ));
    let pipeline = pipeline_with(&dir, synth, Arc::new(OfflineRegistry));

    let report = pipeline
        .run(vec![request("p1", "Panel 1: one", "one")], RunContext::new(0))
        .await;

    let failure = report.failure("p1").unwrap();
    assert_eq!(failure.family(), "persistence");
    assert_eq!(failure.kind(), "registry_write_failed");
    assert!(dir.path().join("images/p1_0.png").exists());
}

#[tokio::test]
async fn test_observer_sees_ordered_lifecycle() {
    let dir = TempDir::new().unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[
            ("base", Behavior::Image(vec![1])),
            ("edit", Behavior::Image(vec![2])),
            (
                "bad",
                Behavior::Fail(SynthesisErrorKind::Rejected("BLOCKLIST".to_string())),
            ),
        ],
    ));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let pipeline = pipeline_with(&dir, synth, Arc::new(InMemoryArtifactRegistry::new()))
        .with_observer(tx);

    pipeline
        .run(
            vec![
                request("a", "Panel 1: base", "base"),
                edit_request("b", "Panel 2: edit", "edit", PriorImage::Panel("a".into())),
                request("c", "Panel 3: bad", "bad"),
            ],
            RunContext::new(0),
        )
        .await;
    drop(pipeline);

    let mut transitions: Vec<PanelTransition> = Vec::new();
    while let Ok(t) = rx.try_recv() {
        transitions.push(t);
    }

    let states_of = |panel: &str| -> Vec<PanelState> {
        transitions
            .iter()
            .filter(|t| t.panel() == panel)
            .map(|t| *t.to())
            .collect()
    };
    assert_eq!(
        states_of("a"),
        vec![PanelState::Synthesizing, PanelState::Persisted, PanelState::Ordered]
    );
    assert_eq!(
        states_of("b"),
        vec![PanelState::Synthesizing, PanelState::Persisted, PanelState::Ordered]
    );
    assert_eq!(states_of("c"), vec![PanelState::Synthesizing, PanelState::Failed]);

    let position = |panel: &str, to: PanelState| {
        transitions
            .iter()
            .position(|t| t.panel() == panel && *t.to() == to)
            .unwrap()
    };
    assert!(position("a", PanelState::Persisted) < position("b", PanelState::Synthesizing));
    assert!(
        transitions
            .iter()
            .all(|t| t.from().can_transition_to(*t.to()))
    );
}

#[tokio::test]
async fn test_colliding_artifact_names_are_refused_before_synthesis() {
    let dir = TempDir::new().unwrap();
    let synth = Arc::new(ScriptedSynthesizer::new(
        &dir.path().join("images"),
        &[
            ("first", Behavior::Image(vec![1])),
            ("second", Behavior::Image(vec![2])),
            ("third", Behavior::Image(vec![3])),
        ],
    ));
    let pipeline = pipeline_with(&dir, synth.clone(), Arc::new(InMemoryArtifactRegistry::new()));

    let requests = vec![
        request("panel 1", "Panel 1: first", "first"),
        request("panel_1", "Panel 2: second", "second"),
        edit_request(
            "follow_up",
            "Panel 3: third",
            "third",
            PriorImage::Panel("panel_1".to_string()),
        ),
    ];

    let report = pipeline.run(requests, RunContext::new(7)).await;

    assert_eq!(report.successes().len(), 1);
    assert_eq!(
        report.success("panel 1").unwrap().artifact().path(),
        "images/panel_1_7.png"
    );
    let collision = report.failure("panel_1").unwrap();
    assert_eq!(collision.kind(), "name_collision");
    assert!(matches!(
        collision.cause(),
        FailureCause::Persistence(comicsmith_error::PersistenceErrorKind::NameCollision { claimed_by, .. })
            if claimed_by == "panel 1"
    ));
    assert_eq!(report.failure("follow_up").unwrap().kind(), "source_not_found");

    let prompts: Vec<String> = synth.calls().into_iter().map(|c| c.prompt).collect();
    assert_eq!(prompts, vec!["first".to_string()]);
    assert_eq!(
        std::fs::read(dir.path().join("images/panel_1_7.png")).unwrap(),
        vec![1]
    );
}
