//! Synthesis limiter built on governor and a Tokio semaphore.
//!
//! Two limits are enforced together:
//! - **Requests per minute**: GCRA quota via governor
//! - **Concurrent calls**: Tokio semaphore, which makes the pipeline's task
//!   set behave as a bounded worker pool

use crate::{RateLimitError, RateLimitErrorKind, SynthesisLimits};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::Semaphore;

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared limiter for all synthesis calls of a run.
///
/// Cheap to clone; clones share the same quota and slots.
///
/// # Example
///
/// ```rust,ignore
/// use comicsmith_rate_limit::{SynthesisLimiter, SynthesisLimits};
///
/// let limiter = SynthesisLimiter::new(&SynthesisLimits::default())?;
/// let guard = limiter.acquire().await?;
/// // call the synthesizer...
/// drop(guard); // frees the slot
/// ```
#[derive(Clone)]
pub struct SynthesisLimiter {
    rpm_limiter: Option<Arc<DirectRateLimiter>>,
    concurrent_semaphore: Arc<Semaphore>,
    max_concurrent: u32,
}

impl SynthesisLimiter {
    /// Create a limiter from limits.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_concurrent` is zero, which would never admit
    /// a call.
    pub fn new(limits: &SynthesisLimits) -> Result<Self, RateLimitError> {
        let max_concurrent = *limits.max_concurrent();
        if max_concurrent == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::Config(
                "max_concurrent must be at least 1".to_string(),
            )));
        }

        let rpm_limiter = limits.requests_per_minute().and_then(|rpm| {
            NonZeroU32::new(rpm).map(|n| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(n))))
        });

        tracing::debug!(
            max_concurrent,
            requests_per_minute = ?limits.requests_per_minute(),
            "Created synthesis limiter"
        );

        Ok(Self {
            rpm_limiter,
            concurrent_semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
            max_concurrent,
        })
    }

    /// Wait until both the rate quota and a concurrency slot are available.
    ///
    /// The slot is taken last so a call waiting on quota does not hold one.
    ///
    /// # Errors
    ///
    /// Returns an error if the limiter has been closed.
    pub async fn acquire(&self) -> Result<LimiterGuard, RateLimitError> {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.until_ready().await;
        }

        let permit = self
            .concurrent_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RateLimitError::new(RateLimitErrorKind::Closed(e.to_string())))?;

        Ok(LimiterGuard { _permit: permit })
    }

    /// Slots not currently held.
    pub fn available_slots(&self) -> usize {
        self.concurrent_semaphore.available_permits()
    }

    /// Configured concurrency.
    pub fn max_concurrent(&self) -> u32 {
        self.max_concurrent
    }
}

impl std::fmt::Debug for SynthesisLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisLimiter")
            .field("rate_limited", &self.rpm_limiter.is_some())
            .field("max_concurrent", &self.max_concurrent)
            .field("available_slots", &self.available_slots())
            .finish()
    }
}

/// RAII guard releasing a concurrency slot when dropped, even on panic.
#[derive(Debug)]
pub struct LimiterGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
