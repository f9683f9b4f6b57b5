//! Capability traits for backends and contracts for external collaborators.

use crate::{AssemblyInput, ThresholdConfig};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use storybooker_core::{
    Character, DocumentHandle, ImageRequest, ImageResponse, JobId, TextRequest, TextResponse,
};
use storybooker_error::{CapabilityKind, FailureClass, ProviderError, StorybookerResult};

/// A named backend able to perform one capability kind.
pub trait ProviderCandidate: Send + Sync {
    /// Provider name used for ordering and diagnostics (e.g. "groq").
    fn provider_name(&self) -> &str;

    /// Default model identifier.
    fn model_name(&self) -> &str;

    /// Capability this candidate serves.
    fn capability(&self) -> CapabilityKind;

    /// This candidate's own classification of `err`, consulted before the
    /// shared classifier. `None` defers to the shared rules.
    fn classify_failure(&self, _err: &ProviderError) -> Option<FailureClass> {
        None
    }
}

impl<T: ProviderCandidate + ?Sized> ProviderCandidate for Arc<T> {
    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn capability(&self) -> CapabilityKind {
        (**self).capability()
    }

    fn classify_failure(&self, err: &ProviderError) -> Option<FailureClass> {
        (**self).classify_failure(err)
    }
}

/// Backends that complete text prompts.
///
/// Errors are raw provider observations; classification happens in the
/// invocation layer.
#[async_trait]
pub trait TextGenerator: ProviderCandidate {
    /// Complete the request.
    async fn generate(&self, req: &TextRequest) -> Result<TextResponse, ProviderError>;
}

/// Backends that render images from prompts.
#[async_trait]
pub trait ImageGenerator: ProviderCandidate {
    /// Render the request.
    async fn generate_image(&self, req: &ImageRequest) -> Result<ImageResponse, ProviderError>;
}

/// Persistent characters selectable by id.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Load a character.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` with `NotFound` when no character has this id.
    async fn load(&self, id: &str) -> StorybookerResult<Character>;

    /// Whether a character with this id exists.
    async fn exists(&self, id: &str) -> StorybookerResult<bool>;

    /// Save a character, returning its id.
    async fn save(&self, character: &Character) -> StorybookerResult<String>;

    /// All stored characters.
    async fn list(&self) -> StorybookerResult<Vec<Character>>;
}

/// Pixel-level post-processing of generated images.
///
/// Synchronous and pure from the caller's point of view.
pub trait ImagePostProcessor: Send + Sync {
    /// Turn raw provider bytes into final image bytes.
    fn process(&self, raw: &[u8], config: &ThresholdConfig) -> StorybookerResult<Vec<u8>>;
}

/// Per-job storage for generated images.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Save image bytes under `name` for the job, returning where they landed.
    async fn save_image(&self, job: JobId, name: &str, bytes: &[u8])
    -> StorybookerResult<PathBuf>;
}

/// Renders one finished document per language.
#[async_trait]
pub trait DocumentAssembler: Send + Sync {
    /// Assemble a document. Null page images and a null cover are allowed.
    async fn assemble(&self, input: &AssemblyInput<'_>) -> StorybookerResult<DocumentHandle>;
}
