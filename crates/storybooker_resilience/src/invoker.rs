//! Ordered fallback across interchangeable provider candidates.

use crate::{FailureClassifier, KeywordClassifier, RetryPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storybooker_error::{CandidateFailure, CapabilityKind, FailureClass, InvocationError};
use storybooker_interface::ProviderCandidate;
use tracing::{debug, info, instrument, warn};

/// Result of one attempt against one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempt returned a value
    Success,
    /// The attempt failed with this class
    Failed(FailureClass),
}

/// Diagnostics of one attempt, kept for the caller's logs.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct AttemptDiagnostic {
    /// Candidate name
    candidate: String,
    /// Model identifier of the candidate
    model: String,
    /// 1-based attempt number against this candidate
    attempt: u32,
    /// Wall-clock time of the attempt
    elapsed: Duration,
    /// What happened
    outcome: AttemptOutcome,
}

/// Outcome of an invocation plus per-attempt diagnostics.
#[derive(Debug)]
pub struct InvocationReport<T> {
    /// Value from the first successful candidate, or the aggregated failure
    pub outcome: Result<T, InvocationError>,
    /// Candidate that produced the value
    pub served_by: Option<String>,
    /// Every attempt in order
    pub diagnostics: Vec<AttemptDiagnostic>,
}

impl<T> InvocationReport<T> {
    /// Drop diagnostics and keep the outcome.
    pub fn into_result(self) -> Result<T, InvocationError> {
        self.outcome
    }

    /// Total wall-clock time across attempts.
    pub fn total_elapsed(&self) -> Duration {
        self.diagnostics.iter().map(|d| d.elapsed).sum()
    }
}

/// Builds the attempt order: the preferred candidate first, then the
/// remaining candidates in their fixed order. Names appearing twice are
/// tried once.
///
/// An unknown preferred name is ignored.
pub fn attempt_order<C>(preferred: Option<&str>, fixed: &[C]) -> Vec<C>
where
    C: ProviderCandidate + Clone,
{
    let mut order: Vec<C> = Vec::with_capacity(fixed.len());
    if let Some(name) = preferred {
        match fixed.iter().find(|c| c.provider_name().eq_ignore_ascii_case(name)) {
            Some(candidate) => order.push(candidate.clone()),
            None => warn!(preferred = name, "Preferred provider not configured, using fixed order"),
        }
    }
    for candidate in fixed {
        if !order
            .iter()
            .any(|c| c.provider_name().eq_ignore_ascii_case(candidate.provider_name()))
        {
            order.push(candidate.clone());
        }
    }
    order
}

/// Stateless resilient invoker.
///
/// Tries candidates in order under a per-attempt deadline and returns the
/// first success. Transient failures are retried against the same candidate
/// with exponential backoff, within a per-candidate budget of
/// `per_attempt_timeout * (1 + retry_budget)`. Every other failure class
/// moves straight to the next candidate.
#[derive(Clone)]
pub struct Invoker {
    policy: RetryPolicy,
    classifier: Arc<dyn FailureClassifier>,
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Arc::new(KeywordClassifier::default()))
    }
}

impl Invoker {
    /// Invoker with the given policy and classifier.
    pub fn new(policy: RetryPolicy, classifier: Arc<dyn FailureClassifier>) -> Self {
        Self { policy, classifier }
    }

    /// Retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Upper bound on a whole invocation over `candidates` candidates.
    pub fn latency_bound(&self, candidates: usize, per_attempt_timeout: Duration) -> Duration {
        self.policy
            .candidate_budget(per_attempt_timeout)
            .saturating_mul(candidates as u32)
    }

    /// Invoke `call` against each candidate in order until one succeeds.
    ///
    /// `candidates` must already be in attempt order (see [`attempt_order`]).
    #[instrument(skip(self, candidates, call), fields(capability = %kind, candidates = candidates.len()))]
    pub async fn invoke<C, T, F, Fut>(
        &self,
        kind: CapabilityKind,
        candidates: &[C],
        per_attempt_timeout: Duration,
        mut call: F,
    ) -> InvocationReport<T>
    where
        C: ProviderCandidate + Clone,
        F: FnMut(C) -> Fut,
        Fut: Future<Output = Result<T, storybooker_error::ProviderError>>,
    {
        let mut diagnostics = Vec::new();
        let mut failures = Vec::with_capacity(candidates.len());
        let budget = self.policy.candidate_budget(per_attempt_timeout);

        for candidate in candidates {
            let name = candidate.provider_name().to_string();
            let model = candidate.model_name().to_string();
            let candidate_started = Instant::now();
            let mut backoff = self.policy.backoff();
            let mut attempt: u32 = 0;

            let failure = loop {
                attempt += 1;
                let remaining = budget.saturating_sub(candidate_started.elapsed());
                let deadline = per_attempt_timeout.min(remaining);
                if deadline.is_zero() {
                    break CandidateFailure {
                        candidate: name.clone(),
                        class: FailureClass::Timeout,
                        message: "candidate budget exhausted".to_string(),
                        attempts: attempt - 1,
                    };
                }

                let started = Instant::now();
                let result = tokio::time::timeout(deadline, call(candidate.clone())).await;
                let elapsed = started.elapsed();

                let (class, message) = match result {
                    Ok(Ok(value)) => {
                        diagnostics.push(AttemptDiagnostic {
                            candidate: name.clone(),
                            model: model.clone(),
                            attempt,
                            elapsed,
                            outcome: AttemptOutcome::Success,
                        });
                        info!(
                            candidate = %name,
                            model = %model,
                            attempt,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Provider attempt succeeded"
                        );
                        return InvocationReport {
                            outcome: Ok(value),
                            served_by: Some(name),
                            diagnostics,
                        };
                    }
                    Ok(Err(err)) => {
                        let class = candidate
                            .classify_failure(&err)
                            .unwrap_or_else(|| self.classifier.classify(&err));
                        (class, err.kind.to_string())
                    }
                    Err(_) => (
                        FailureClass::Timeout,
                        format!("no response within {} ms", deadline.as_millis()),
                    ),
                };

                diagnostics.push(AttemptDiagnostic {
                    candidate: name.clone(),
                    model: model.clone(),
                    attempt,
                    elapsed,
                    outcome: AttemptOutcome::Failed(class),
                });
                warn!(
                    candidate = %name,
                    model = %model,
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    class = %class,
                    error = %message,
                    "Provider attempt failed"
                );

                if class.is_retryable() && attempt <= *self.policy.retry_budget() {
                    let delay = backoff
                        .next()
                        .unwrap_or(Duration::from_millis(*self.policy.max_backoff_ms()));
                    let remaining = budget.saturating_sub(candidate_started.elapsed());
                    if delay < remaining {
                        debug!(candidate = %name, delay_ms = delay.as_millis() as u64, "Retrying after backoff");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    debug!(candidate = %name, "No budget left for another attempt");
                }

                break CandidateFailure {
                    candidate: name.clone(),
                    class,
                    message,
                    attempts: attempt,
                };
            };

            failures.push(failure);
        }

        warn!(
            capability = %kind,
            tried = failures.len(),
            "Every provider candidate failed"
        );
        InvocationReport {
            outcome: Err(InvocationError::new(kind, failures)),
            served_by: None,
            diagnostics,
        }
    }
}
