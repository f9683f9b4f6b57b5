//! HTTP surface error types.

/// Error kinds for the job submission and status surface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum ServerErrorKind {
    /// Request body or query was invalid
    #[display("Bad request: {}", _0)]
    BadRequest(String),
    /// Job, document or character does not exist
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Resource exists but is not ready
    #[display("Conflict: {}", _0)]
    Conflict(String),
    /// Server could not bind or serve
    #[display("Server failed: {}", _0)]
    Internal(String),
}

/// Error wrapper with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Server Error: {} at line {} in {}", kind, line, file)]
pub struct ServerError {
    /// The error kind
    pub kind: ServerErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl ServerError {
    /// Create a new ServerError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ServerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
