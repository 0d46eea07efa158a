//! Artifact registry error types.

/// Kinds of registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RegistryErrorKind {
    /// Artifact not found under the given name
    #[display("Artifact not found: {}", _0)]
    NotFound(String),
    /// I/O error during registry operation
    #[display("I/O error: {}", _0)]
    Io(String),
    /// Registry backend is unavailable
    #[display("Registry unavailable: {}", _0)]
    Unavailable(String),
    /// Content hash mismatch (corruption detected)
    #[display("Content hash mismatch: expected {}, got {}", expected, actual)]
    HashMismatch {
        /// Expected hash value
        expected: String,
        /// Actual hash value found
        actual: String,
    },
}

/// Registry error with location tracking.
///
/// # Examples
///
/// ```
/// use comicsmith_error::{RegistryError, RegistryErrorKind};
///
/// let err = RegistryError::new(RegistryErrorKind::NotFound("panel_1_0".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Registry Error: {} at line {} in {}", kind, line, file)]
pub struct RegistryError {
    /// The kind of error that occurred
    pub kind: RegistryErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RegistryError {
    /// Create a new registry error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RegistryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
