//! Classified job failures.

use crate::{FailureClass, InvocationError};
use serde::{Deserialize, Serialize};

/// Caller-facing classification of a failed job.
///
/// A caller can act on the kind alone: Configuration means fix credentials
/// or settings, Capacity and Timeout mean try again later.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    /// Missing or invalid credential, or no usable provider configured
    #[display("configuration")]
    Configuration,
    /// Rate limited or unavailable across all candidates
    #[display("capacity")]
    Capacity,
    /// All candidates exceeded their deadlines
    #[display("timeout")]
    Timeout,
    /// Provider output or request that cannot be honored
    #[display("contract_violation")]
    ContractViolation,
    /// Character store, asset store or document assembler failed
    #[display("collaborator")]
    Collaborator,
}

impl JobErrorKind {
    /// Short user-facing summary of what to do about the failure.
    pub fn summary(self) -> &'static str {
        match self {
            JobErrorKind::Configuration => "provider credentials or configuration need fixing",
            JobErrorKind::Capacity => "providers are busy or rate limited, try again later",
            JobErrorKind::Timeout => "providers did not respond in time, try again later",
            JobErrorKind::ContractViolation => "the generated content did not meet the request",
            JobErrorKind::Collaborator => "the storybook could not be stored or assembled",
        }
    }
}

/// Job failure with classification and raw diagnostic text.
///
/// # Examples
///
/// ```
/// use storybooker_error::{JobError, JobErrorKind};
///
/// let err = JobError::new(JobErrorKind::ContractViolation, "expected 3 beats, got 2");
/// assert_eq!(err.kind, JobErrorKind::ContractViolation);
/// assert!(format!("{}", err).contains("expected 3 beats"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Job Error: {}: {} at line {} in {}", kind, message, line, file)]
pub struct JobError {
    /// Classification
    pub kind: JobErrorKind,
    /// Human readable message
    pub message: String,
    /// Raw diagnostic text for operators
    pub diagnostic: String,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl JobError {
    /// Create a new JobError whose diagnostic repeats the message.
    #[track_caller]
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_diagnostic(kind, message.clone(), message)
    }

    /// Create a new JobError with separate raw diagnostic text.
    #[track_caller]
    pub fn with_diagnostic(
        kind: JobErrorKind,
        message: impl Into<String>,
        diagnostic: impl Into<String>,
    ) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            diagnostic: diagnostic.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Classify an exhausted provider invocation.
    ///
    /// A Fatal-Auth failure on the last candidate is reported as a
    /// configuration problem with the provider's text kept verbatim.
    #[track_caller]
    pub fn from_invocation(err: &InvocationError) -> Self {
        if let Some(auth) = err.fatal_auth() {
            return Self::with_diagnostic(
                JobErrorKind::Configuration,
                format!("{} rejected the credential", auth.candidate),
                auth.message.clone(),
            );
        }

        if err.failures.is_empty() {
            return Self::new(
                JobErrorKind::Configuration,
                format!("no {} provider is configured", err.capability),
            );
        }

        let kind = if err.failures.iter().all(|f| {
            matches!(f.class, FailureClass::FatalAuth | FailureClass::Unsupported)
        }) {
            JobErrorKind::Configuration
        } else if err.all(FailureClass::Timeout) {
            JobErrorKind::Timeout
        } else {
            JobErrorKind::Capacity
        };

        Self::with_diagnostic(
            kind,
            format!("{} failed on every candidate", err.capability),
            err.diagnostic(),
        )
    }
}
