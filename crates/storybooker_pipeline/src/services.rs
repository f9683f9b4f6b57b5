//! Collaborators shared by every job.

use std::sync::Arc;
use std::time::Duration;
use storybooker_characters::FileSystemCharacterStore;
use storybooker_core::{ArtStyle, RequestLimits};
use storybooker_error::StorybookerResult;
use storybooker_interface::{
    AssetStore, CharacterStore, DocumentAssembler, ImageGenerator, ImagePostProcessor,
    TextGenerator, ThresholdConfig,
};
use storybooker_models::{build_image_candidates, build_text_candidates};
use storybooker_resilience::{Invoker, StorybookerConfig};
use storybooker_storage::{FileSystemAssetStore, HtmlDocumentAssembler, StandardPostProcessor};
use tracing::info;

/// Candidates, deadlines and preference for one capability kind.
#[derive(Clone)]
pub struct CapabilityPool<C> {
    /// Candidates in fixed fallback order
    pub candidates: Vec<C>,
    /// Candidate tried first unless a request names another
    pub preferred: Option<String>,
    /// Per-attempt deadline
    pub timeout: Duration,
}

impl<C> std::fmt::Debug for CapabilityPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityPool")
            .field("candidates", &self.candidates.len())
            .field("preferred", &self.preferred)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Everything a job needs, shared read-only across jobs.
#[derive(Clone)]
pub struct Services {
    /// Text generation candidates
    pub text: CapabilityPool<Arc<dyn TextGenerator>>,
    /// Image generation candidates
    pub image: CapabilityPool<Arc<dyn ImageGenerator>>,
    /// Resilient invoker
    pub invoker: Invoker,
    /// Persistent characters
    pub characters: Arc<dyn CharacterStore>,
    /// Generated image storage
    pub assets: Arc<dyn AssetStore>,
    /// Image post-processing
    pub post_processor: Arc<dyn ImagePostProcessor>,
    /// Document rendering
    pub assembler: Arc<dyn DocumentAssembler>,
    /// Submission limits
    pub limits: RequestLimits,
    /// Style used when a request leaves it at the default
    pub default_style: ArtStyle,
    /// Beats in flight at once during art direction and page images
    pub beat_concurrency: usize,
    /// Post-processing for character references
    pub reference_cutout: ThresholdConfig,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("text", &self.text)
            .field("image", &self.image)
            .field("invoker", &self.invoker)
            .field("limits", &self.limits)
            .field("beat_concurrency", &self.beat_concurrency)
            .finish_non_exhaustive()
    }
}

impl Services {
    /// Wire providers, stores and collaborators from configuration.
    ///
    /// Credentials are read through `lookup`.
    pub fn from_config<F>(config: &StorybookerConfig, lookup: F) -> StorybookerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = build_text_candidates(&config.text, &lookup)?;
        let image = build_image_candidates(&config.image, &lookup)?;
        info!(
            text = text.len(),
            image = image.len(),
            preferred_text = %config.text.preferred,
            preferred_image = %config.image.preferred,
            "Provider candidates ready"
        );

        Ok(Self {
            text: CapabilityPool {
                candidates: text,
                preferred: Some(config.text.preferred.clone()),
                timeout: config.text.timeout(),
            },
            image: CapabilityPool {
                candidates: image,
                preferred: Some(config.image.preferred.clone()),
                timeout: config.image.timeout(),
            },
            invoker: Invoker::new(config.retry.clone(), Arc::new(config.classifier.classifier())),
            characters: Arc::new(FileSystemCharacterStore::new(&config.paths.characters_dir)?),
            assets: Arc::new(FileSystemAssetStore::new(&config.paths.assets_dir)?),
            post_processor: Arc::new(StandardPostProcessor::new()),
            assembler: Arc::new(HtmlDocumentAssembler::new(&config.paths.output_dir)),
            limits: config.job.limits(),
            default_style: config.job.default_style,
            beat_concurrency: config.job.beat_concurrency.max(1),
            reference_cutout: ThresholdConfig::cutout(
                config.post_processing.threshold,
                config.post_processing.padding,
            ),
        })
    }
}
