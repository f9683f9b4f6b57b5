//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Requested record does not exist
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Invalid storage path or identifier
    #[display("Invalid storage path: {}", _0)]
    InvalidPath(String),
    /// Stored record could not be (de)serialized
    #[display("Serialization failed: {}", _0)]
    Serialization(String),
    /// Image bytes could not be decoded or encoded
    #[display("Image processing failed: {}", _0)]
    Image(String),
    /// Document could not be assembled
    #[display("Document assembly failed: {}", _0)]
    Assembly(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use storybooker_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("chr_luna".to_string()));
/// assert!(format!("{}", err).contains("Not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// True when the error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, StorageErrorKind::NotFound(_))
    }
}
