//! Limit configuration for synthesis calls.

use serde::{Deserialize, Serialize};

/// Default number of synthesis calls allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT: u32 = 4;

/// Limits applied to every synthesis call of a run.
///
/// # Examples
///
/// ```
/// use comicsmith_rate_limit::SynthesisLimits;
///
/// let limits = SynthesisLimits::builder()
///     .max_concurrent(2u32)
///     .requests_per_minute(Some(10))
///     .build()
///     .unwrap();
/// assert_eq!(*limits.max_concurrent(), 2);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct SynthesisLimits {
    /// Maximum calls in flight
    #[builder(default = "DEFAULT_MAX_CONCURRENT")]
    max_concurrent: u32,
    /// Maximum calls started per minute (`None` = unlimited)
    #[builder(default)]
    requests_per_minute: Option<u32>,
}

impl SynthesisLimits {
    /// Returns a builder for constructing limits.
    pub fn builder() -> SynthesisLimitsBuilder {
        SynthesisLimitsBuilder::default()
    }

    /// No rate quota, default concurrency.
    pub fn unthrottled(max_concurrent: u32) -> Self {
        Self {
            max_concurrent,
            requests_per_minute: None,
        }
    }
}

impl Default for SynthesisLimits {
    fn default() -> Self {
        Self::unthrottled(DEFAULT_MAX_CONCURRENT)
    }
}
