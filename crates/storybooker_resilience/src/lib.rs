//! Resilient provider invocation.
//!
//! Given an ordered list of interchangeable candidates for one capability,
//! [`Invoker::invoke`] attempts each under a deadline, classifies failures
//! with a pluggable [`FailureClassifier`], retries transient failures with
//! backoff, and falls through to the next candidate. Exhaustion yields an
//! [`InvocationError`](storybooker_error::InvocationError) holding the last
//! failure per candidate.
//!
//! This crate also owns the layered service configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classifier;
mod config;
mod invoker;
mod policy;

pub use classifier::{DEFAULT_RATE_LIMIT_KEYWORDS, FailureClassifier, KeywordClassifier};
pub use config::{
    CapabilityConfig, ClassifierConfig, JobConfig, LoggingConfig, PathsConfig,
    PostProcessingConfig, ProviderSettings, ServerConfig, StorybookerConfig,
};
pub use invoker::{AttemptDiagnostic, AttemptOutcome, InvocationReport, Invoker, attempt_order};
pub use policy::{RetryPolicy, RetryPolicyBuilder, RetryPolicyBuilderError};
