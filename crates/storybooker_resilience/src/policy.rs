//! Retry policy for transient failures.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};

/// How often and how patiently a candidate is retried after a transient
/// failure.
///
/// # Examples
///
/// ```
/// use storybooker_resilience::RetryPolicyBuilder;
///
/// let policy = RetryPolicyBuilder::default()
///     .retry_budget(1u32)
///     .initial_backoff_ms(100u64)
///     .jitter(false)
///     .build()
///     .unwrap();
///
/// let delays: Vec<_> = policy.backoff().take(3).collect();
/// assert_eq!(delays[0].as_millis(), 100);
/// assert_eq!(delays[1].as_millis(), 200);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(default)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra attempts allowed per candidate after a transient failure
    retry_budget: u32,
    /// First backoff delay
    initial_backoff_ms: u64,
    /// Backoff ceiling
    max_backoff_ms: u64,
    /// Randomize delays below the computed backoff
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_budget: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            retry_budget: 0,
            ..Self::default()
        }
    }

    /// Doubling backoff delays starting at `initial_backoff_ms`.
    pub fn backoff(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let factor = (self.initial_backoff_ms / 2).max(1);
        let delays = ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(Duration::from_millis(self.max_backoff_ms.max(1)));
        if self.jitter {
            Box::new(delays.map(jitter))
        } else {
            Box::new(delays)
        }
    }

    /// Upper bound on time spent with one candidate.
    pub fn candidate_budget(&self, per_attempt_timeout: Duration) -> Duration {
        per_attempt_timeout.saturating_mul(1 + self.retry_budget)
    }
}
