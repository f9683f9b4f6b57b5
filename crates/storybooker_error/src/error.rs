//! Top-level error wrapper types.

use crate::{
    ConfigError, InvocationError, JobError, JsonError, ProviderError, ServerError, StorageError,
};

/// Every error the storybooker crates can produce.
///
/// # Examples
///
/// ```
/// use storybooker_error::{ConfigError, StorybookerError};
///
/// let err: StorybookerError = ConfigError::new("no text providers").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StorybookerErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Single provider failure
    #[from(ProviderError)]
    Provider(ProviderError),
    /// All provider candidates failed
    #[from(InvocationError)]
    Invocation(InvocationError),
    /// Classified job failure
    #[from(JobError)]
    Job(JobError),
    /// HTTP surface error
    #[from(ServerError)]
    Server(ServerError),
}

/// Storybooker error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Storybooker Error: {}", _0)]
pub struct StorybookerError(Box<StorybookerErrorKind>);

impl StorybookerError {
    /// Create a new error from a kind.
    pub fn new(kind: StorybookerErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorybookerErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to StorybookerErrorKind
impl<T> From<T> for StorybookerError
where
    T: Into<StorybookerErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Storybooker operations.
pub type StorybookerResult<T> = std::result::Result<T, StorybookerError>;
