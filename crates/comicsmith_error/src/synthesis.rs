//! Synthesis error types and retry classification.

/// Why a synthesis call did not produce an image.
///
/// Each kind is preserved end to end so the run report can tell a policy
/// block apart from an empty response or a network failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SynthesisErrorKind {
    /// The provider blocked the prompt or the output on safety/policy grounds
    Rejected(String),
    /// The call completed but returned zero usable image parts
    NoResult(String),
    /// Network, HTTP, timeout or decoding failure talking to the provider
    TransportError {
        /// HTTP status code, when the provider answered
        status_code: Option<u16>,
        /// Error message
        message: String,
    },
    /// The base image for an edit could not be loaded
    SourceNotFound(String),
}

impl std::fmt::Display for SynthesisErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisErrorKind::Rejected(reason) => {
                write!(f, "Request rejected by safety policy: {}", reason)
            }
            SynthesisErrorKind::NoResult(msg) => write!(f, "No image data was generated: {}", msg),
            SynthesisErrorKind::TransportError {
                status_code: Some(code),
                message,
            } => write!(f, "Transport error (HTTP {}): {}", code, message),
            SynthesisErrorKind::TransportError {
                status_code: None,
                message,
            } => write!(f, "Transport error: {}", message),
            SynthesisErrorKind::SourceNotFound(path) => {
                write!(f, "Source image not found: {}", path)
            }
        }
    }
}

impl SynthesisErrorKind {
    /// Convenience constructor for transport failures without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        SynthesisErrorKind::TransportError {
            status_code: None,
            message: message.into(),
        }
    }

    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthesisErrorKind::TransportError {
                status_code: Some(code),
                ..
            } => matches!(*code, 408 | 429 | 500 | 502 | 503 | 504),
            // Connection resets and similar failures carry no status.
            SynthesisErrorKind::TransportError {
                status_code: None, ..
            } => true,
            _ => false,
        }
    }

    /// Get retry strategy parameters for this error type.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    pub fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self {
            SynthesisErrorKind::TransportError {
                status_code: Some(code),
                ..
            } => match *code {
                429 => (5000, 3, 40),
                503 => (2000, 5, 60),
                500 | 502 | 504 => (1000, 3, 8),
                408 => (2000, 4, 30),
                _ => (2000, 5, 60),
            },
            SynthesisErrorKind::TransportError { .. } => (1000, 3, 10),
            _ => (2000, 5, 60),
        }
    }
}

/// Synthesis error with source location tracking.
///
/// # Examples
///
/// ```
/// use comicsmith_error::{SynthesisError, SynthesisErrorKind};
///
/// let err = SynthesisError::new(SynthesisErrorKind::Rejected("SAFETY".to_string()));
/// assert!(format!("{}", err).contains("rejected"));
/// assert_eq!(err.kind.as_ref(), "rejected");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Synthesis Error: {} at line {} in {}", kind, line, file)]
pub struct SynthesisError {
    /// The kind of error that occurred
    pub kind: SynthesisErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SynthesisError {
    /// Create a new SynthesisError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SynthesisErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<SynthesisErrorKind> for SynthesisError {
    #[track_caller]
    fn from(kind: SynthesisErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use comicsmith_error::{RetryableError, SynthesisError, SynthesisErrorKind};
///
/// let err = SynthesisError::new(SynthesisErrorKind::TransportError {
///     status_code: Some(503),
///     message: "Service unavailable".to_string(),
/// });
///
/// assert!(err.is_retryable());
/// let (backoff, retries, _max_delay) = err.retry_strategy_params();
/// assert_eq!(backoff, 2000);
/// assert_eq!(retries, 5);
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;

    /// Get retry strategy parameters for this error.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (2000, 5, 60)
    }
}

impl RetryableError for SynthesisError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        self.kind.retry_strategy_params()
    }
}
