//! Errors produced when every provider candidate has failed.

use crate::FailureClass;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The capability a candidate provides.
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
pub enum CapabilityKind {
    /// Text completion
    #[display("text-generation")]
    TextGeneration,
    /// Image rendering
    #[display("image-generation")]
    ImageGeneration,
}

/// Last classified failure of one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFailure {
    /// Candidate name
    pub candidate: String,
    /// Classification of the final attempt
    pub class: FailureClass,
    /// Raw provider text of the final attempt
    pub message: String,
    /// Number of attempts made against this candidate
    pub attempts: u32,
}

/// Every candidate for a capability failed.
///
/// Holds the last failure per candidate in attempt order.
#[derive(Debug, Clone, derive_more::Error)]
pub struct InvocationError {
    /// Capability being invoked
    pub capability: CapabilityKind,
    /// Last failure of each candidate tried, in attempt order
    pub failures: Vec<CandidateFailure>,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl InvocationError {
    /// Create a new InvocationError with automatic location tracking.
    #[track_caller]
    pub fn new(capability: CapabilityKind, failures: Vec<CandidateFailure>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            capability,
            failures,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The failure of the last candidate tried.
    pub fn last_failure(&self) -> Option<&CandidateFailure> {
        self.failures.last()
    }

    /// The final Fatal-Auth failure, when it ended the invocation.
    pub fn fatal_auth(&self) -> Option<&CandidateFailure> {
        self.last_failure()
            .filter(|failure| failure.class == FailureClass::FatalAuth)
    }

    /// True when every candidate failed with the given class.
    pub fn all(&self, class: FailureClass) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(|f| f.class == class)
    }

    /// Raw diagnostic text, one line per candidate.
    pub fn diagnostic(&self) -> String {
        self.failures
            .iter()
            .map(|f| {
                format!(
                    "{} [{}, {} attempt(s)]: {}",
                    f.candidate, f.class, f.attempts, f.message
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invocation Error: {} failed on {} candidate(s)",
            self.capability,
            self.failures.len()
        )?;
        if let Some(last) = self.last_failure() {
            write!(f, " (last: {} {}: {})", last.candidate, last.class, last.message)?;
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}
