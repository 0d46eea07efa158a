//! Comic script error types.

/// Specific error conditions for comic script loading and validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScriptErrorKind {
    /// Failed to read script file
    FileRead(String),
    /// Failed to parse TOML content
    TomlParse(String),
    /// Script defines no panels
    NoPanels,
    /// Panel name is empty
    EmptyName,
    /// Two panels share a name
    DuplicatePanel(String),
    /// Panel prompt is empty or contains only whitespace
    EmptyPrompt(String),
    /// Panel declares both `edit_from` and `base_image`
    ConflictingSource(String),
    /// Panel edits a panel that does not exist
    UnknownAncestor {
        /// Panel declaring the edit
        panel: String,
        /// Name it refers to
        ancestor: String,
    },
    /// Edit chains form a cycle
    CircularChain(Vec<String>),
    /// Two panel names produce the same artifact file name
    ArtifactNameCollision {
        /// Panel defined first
        first: String,
        /// Panel defined later
        second: String,
    },
}

impl std::fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptErrorKind::FileRead(msg) => write!(f, "Failed to read comic script: {}", msg),
            ScriptErrorKind::TomlParse(msg) => write!(f, "Failed to parse TOML: {}", msg),
            ScriptErrorKind::NoPanels => write!(f, "Comic script must define at least one panel"),
            ScriptErrorKind::EmptyName => write!(f, "Panel name cannot be empty"),
            ScriptErrorKind::DuplicatePanel(name) => {
                write!(f, "Panel '{}' is defined more than once", name)
            }
            ScriptErrorKind::EmptyPrompt(name) => write!(f, "Panel '{}' has an empty prompt", name),
            ScriptErrorKind::ConflictingSource(name) => write!(
                f,
                "Panel '{}' sets both edit_from and base_image; choose one",
                name
            ),
            ScriptErrorKind::UnknownAncestor { panel, ancestor } => write!(
                f,
                "Panel '{}' edits '{}', which is not defined in this script",
                panel, ancestor
            ),
            ScriptErrorKind::CircularChain(names) => {
                write!(f, "Circular edit chain: {}", names.join(" → "))
            }
            ScriptErrorKind::ArtifactNameCollision { first, second } => write!(
                f,
                "Panels '{}' and '{}' would be saved under the same artifact name; rename one",
                first, second
            ),
        }
    }
}

/// Error type for comic script operations.
///
/// # Examples
///
/// ```
/// use comicsmith_error::{ScriptError, ScriptErrorKind};
///
/// let err = ScriptError::new(ScriptErrorKind::NoPanels);
/// assert!(format!("{}", err).contains("at least one panel"));
/// ```
#[derive(Debug, Clone)]
pub struct ScriptError {
    /// The specific error condition
    pub kind: ScriptErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ScriptError {
    /// Create a new ScriptError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ScriptErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Script Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for ScriptError {}
