//! Persistence error types for the two artifact sinks.

/// Kinds of persistence failures.
///
/// An artifact is written to the local working tree and to the durable
/// registry. Every variant states which sink holds the bytes afterwards so a
/// partial write is never mistaken for a clean failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PersistenceErrorKind {
    /// Working-tree write failed; the registry write may have succeeded
    #[display(
        "Local write to {} failed ({}); registry {}",
        path,
        message,
        if *registry_written { "holds the artifact" } else { "was not written" }
    )]
    LocalWriteFailed {
        /// Target path in the working tree
        path: String,
        /// Underlying error message
        message: String,
        /// Whether the registry sink accepted the artifact
        registry_written: bool,
    },
    /// Registry write failed after the local file was written
    #[display(
        "Registry write of {} failed ({}); local file exists at {}",
        artifact,
        message,
        local_path
    )]
    RegistryWriteFailed {
        /// Artifact name
        artifact: String,
        /// Path of the file that was written locally
        local_path: String,
        /// Underlying error message
        message: String,
    },
    /// Neither sink accepted the artifact
    #[display("Both sinks failed: local ({}), registry ({})", local, registry)]
    BothFailed {
        /// Local failure message
        local: String,
        /// Registry failure message
        registry: String,
    },
    /// Display name cannot produce a usable artifact name
    #[display("Invalid artifact name: {}", _0)]
    InvalidName(String),
    /// Two panels of one run map to the same artifact name
    #[display(
        "Panel '{}' maps to artifact {} already claimed by panel '{}'",
        panel,
        artifact,
        claimed_by
    )]
    NameCollision {
        /// Panel that was refused
        panel: String,
        /// Panel that claimed the name first
        claimed_by: String,
        /// Shared artifact name
        artifact: String,
    },
}

impl PersistenceErrorKind {
    /// Whether the local working tree holds the artifact despite the failure.
    pub fn local_written(&self) -> bool {
        matches!(self, PersistenceErrorKind::RegistryWriteFailed { .. })
    }

    /// Whether the registry holds the artifact despite the failure.
    pub fn registry_written(&self) -> bool {
        matches!(
            self,
            PersistenceErrorKind::LocalWriteFailed {
                registry_written: true,
                ..
            }
        )
    }
}

/// Persistence error with location tracking.
///
/// # Examples
///
/// ```
/// use comicsmith_error::{PersistenceError, PersistenceErrorKind};
///
/// let err = PersistenceError::new(PersistenceErrorKind::RegistryWriteFailed {
///     artifact: "panel_1_0".to_string(),
///     local_path: "out/images/panel_1_0.png".to_string(),
///     message: "disk full".to_string(),
/// });
/// assert!(err.kind.local_written());
/// assert!(format!("{}", err).contains("local file exists"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Persistence Error: {} at line {} in {}", kind, line, file)]
pub struct PersistenceError {
    /// The kind of error that occurred
    pub kind: PersistenceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PersistenceError {
    /// Create a new persistence error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PersistenceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
