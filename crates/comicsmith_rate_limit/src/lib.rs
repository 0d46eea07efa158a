//! Concurrency and request-rate limits for synthesis calls.
//!
//! Synthesis is I/O bound and rate limited by the provider, so every call of
//! a run goes through one [`SynthesisLimiter`].

mod error;
mod limiter;
mod limits;

pub use error::{RateLimitError, RateLimitErrorKind};
pub use limiter::{LimiterGuard, SynthesisLimiter};
pub use limits::{DEFAULT_MAX_CONCURRENT, SynthesisLimits, SynthesisLimitsBuilder};
