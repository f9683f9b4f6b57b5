//! Provider error types and failure classes.

use serde::{Deserialize, Serialize};

/// Raw failure conditions reported by a backend provider.
///
/// These are what a provider observed. Deciding what to *do* about them
/// (retry, fall through, give up) is the job of a failure classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Credential absent or still a placeholder value
    #[display("Missing credential: {}", _0)]
    MissingCredential(String),
    /// HTTP error with status code and response body
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Response body or reason phrase
        message: String,
    },
    /// Connection, DNS or TLS failure before a response was received
    #[display("Transport error: {}", _0)]
    Transport(String),
    /// Requested model does not exist on this provider
    #[display("Model not found: {}", _0)]
    ModelNotFound(String),
    /// Response arrived but could not be decoded
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
    /// Provider cannot satisfy this particular request
    #[display("Unsupported request: {}", _0)]
    UnsupportedRequest(String),
    /// Provider reported a quota or rate limit without an HTTP status
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// Provider reported a temporary outage without an HTTP status
    #[display("Service unavailable: {}", _0)]
    Unavailable(String),
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use storybooker_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::Http {
///     status_code: 503,
///     message: "upstream overloaded".to_string(),
/// });
/// assert!(format!("{}", err).contains("HTTP 503"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// HTTP status code, when the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match &self.kind {
            ProviderErrorKind::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Classification of one failed attempt against one candidate.
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
pub enum FailureClass {
    /// Attempt exceeded its deadline
    #[display("timeout")]
    Timeout,
    /// Backend signalled quota exhaustion or too many requests
    #[display("rate_limited")]
    RateLimited,
    /// Credential invalid or missing
    #[display("fatal_auth")]
    FatalAuth,
    /// Temporary server-side failure
    #[display("transient")]
    Transient,
    /// Candidate cannot satisfy this request
    #[display("unsupported")]
    Unsupported,
}

impl FailureClass {
    /// Whether the same candidate may be tried again.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureClass::Transient)
    }
}
