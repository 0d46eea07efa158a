//! Per-run outcome reporting.

use chrono::{DateTime, Utc};
use comicsmith_core::{ArtifactRef, Ordinal, PanelRecord};
use comicsmith_error::{PersistenceErrorKind, SynthesisErrorKind};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Why a panel failed, with the original error kind preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// No image was produced
    Synthesis(SynthesisErrorKind),
    /// An image was produced but could not be persisted to both sinks
    Persistence(PersistenceErrorKind),
}

impl FailureCause {
    /// Error family, `synthesis` or `persistence`.
    pub fn family(&self) -> &'static str {
        match self {
            FailureCause::Synthesis(_) => "synthesis",
            FailureCause::Persistence(_) => "persistence",
        }
    }

    /// Short machine-readable kind, e.g. `rejected` or `registry_write_failed`.
    pub fn kind_name(&self) -> &str {
        match self {
            FailureCause::Synthesis(kind) => kind.as_ref(),
            FailureCause::Persistence(kind) => match kind {
                PersistenceErrorKind::LocalWriteFailed { .. } => "local_write_failed",
                PersistenceErrorKind::RegistryWriteFailed { .. } => "registry_write_failed",
                PersistenceErrorKind::BothFailed { .. } => "both_failed",
                PersistenceErrorKind::InvalidName(_) => "invalid_name",
                PersistenceErrorKind::NameCollision { .. } => "name_collision",
            },
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Synthesis(kind) => write!(f, "{}", kind),
            FailureCause::Persistence(kind) => write!(f, "{}", kind),
        }
    }
}

/// A panel that reached `Ordered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct PanelSuccess {
    /// Panel display name
    name: String,
    /// Caption text
    description: String,
    /// Persisted artifact
    artifact: ArtifactRef,
    /// Resolved display ordinal
    ordinal: Ordinal,
}

impl PanelSuccess {
    pub(crate) fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        artifact: ArtifactRef,
        ordinal: Ordinal,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            artifact,
            ordinal,
        }
    }

    /// Whether the ordinal fell back to the sentinel.
    pub fn is_fallback(&self) -> bool {
        self.ordinal.is_fallback()
    }

    /// Record for document assembly.
    pub fn to_record(&self) -> PanelRecord {
        PanelRecord::new(self.description.clone(), self.artifact.clone()).with_ordinal(self.ordinal)
    }
}

/// A panel that ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct PanelFailure {
    /// Panel display name
    name: String,
    /// Caption text
    description: String,
    /// Typed cause
    #[serde(skip)]
    cause: FailureCause,
    /// Error family (`synthesis` or `persistence`)
    family: String,
    /// Short kind name
    kind: String,
    /// Human-readable detail
    detail: String,
}

impl PanelFailure {
    pub(crate) fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        cause: FailureCause,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            family: cause.family().to_string(),
            kind: cause.kind_name().to_string(),
            detail: cause.to_string(),
            cause,
        }
    }
}

/// Everything that happened in one pipeline run.
///
/// Successes are listed in display order, failures in request order.
#[derive(Debug, Clone, Serialize, derive_getters::Getters)]
pub struct RunReport {
    /// Unique run identifier
    run_id: Uuid,
    /// Run sequence used for artifact names
    sequence: u64,
    /// When the run started
    started_at: DateTime<Utc>,
    /// When the run finished
    finished_at: DateTime<Utc>,
    /// Panels that reached `Ordered`
    successes: Vec<PanelSuccess>,
    /// Panels that ended in `Failed`
    failures: Vec<PanelFailure>,
    /// Names of panels whose description carried no usable ordinal
    fallbacks: Vec<String>,
}

impl RunReport {
    pub(crate) fn new(
        sequence: u64,
        started_at: DateTime<Utc>,
        successes: Vec<PanelSuccess>,
        failures: Vec<PanelFailure>,
    ) -> Self {
        let fallbacks = successes
            .iter()
            .filter(|s| s.is_fallback())
            .map(|s| s.name.clone())
            .collect();
        Self {
            run_id: Uuid::new_v4(),
            sequence,
            started_at,
            finished_at: Utc::now(),
            successes,
            failures,
            fallbacks,
        }
    }

    /// Whether every panel succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Records of successful panels, in display order.
    pub fn records(&self) -> Vec<PanelRecord> {
        self.successes.iter().map(PanelSuccess::to_record).collect()
    }

    /// Failure for a panel, if it failed.
    pub fn failure(&self, name: &str) -> Option<&PanelFailure> {
        self.failures.iter().find(|f| f.name == name)
    }

    /// Success for a panel, if it succeeded.
    pub fn success(&self, name: &str) -> Option<&PanelSuccess> {
        self.successes.iter().find(|s| s.name == name)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run {} (sequence {}): {} succeeded, {} failed",
            self.run_id,
            self.sequence,
            self.successes.len(),
            self.failures.len()
        )?;
        for success in &self.successes {
            let position = match success.ordinal {
                Ordinal::Parsed(n) => n.to_string(),
                _ => "last".to_string(),
            };
            writeln!(
                f,
                "  ok    {} -> {} (position {})",
                success.name,
                success.artifact.path(),
                position
            )?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "  FAIL  {} [{}/{}] {}",
                failure.name, failure.family, failure.kind, failure.detail
            )?;
        }
        if !self.fallbacks.is_empty() {
            writeln!(
                f,
                "  warning: no panel number found for {}; shown last",
                self.fallbacks.join(", ")
            )?;
        }
        Ok(())
    }
}
