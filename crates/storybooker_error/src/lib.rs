//! Error types for the Storybooker service.
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! Provider failures are raw observations ([`ProviderError`]). The invocation
//! layer classifies them into a [`FailureClass`], aggregates exhausted
//! candidates into an [`InvocationError`], and the job layer turns that into
//! a caller-facing [`JobError`].
//!
//! # Examples
//!
//! ```
//! use storybooker_error::{StorybookerResult, ConfigError};
//!
//! fn load() -> StorybookerResult<String> {
//!     Err(ConfigError::new("missing [text] section"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod invocation;
mod job;
mod json;
mod provider;
mod server;
mod storage;

pub use config::ConfigError;
pub use error::{StorybookerError, StorybookerErrorKind, StorybookerResult};
pub use invocation::{CandidateFailure, CapabilityKind, InvocationError};
pub use job::{JobError, JobErrorKind};
pub use json::JsonError;
pub use provider::{FailureClass, ProviderError, ProviderErrorKind};
pub use server::{ServerError, ServerErrorKind};
pub use storage::{StorageError, StorageErrorKind};
