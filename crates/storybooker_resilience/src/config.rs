//! Layered service configuration.
//!
//! Sources, lowest precedence first:
//! - Bundled defaults (include_str! from storybooker.toml)
//! - `~/.config/storybooker/storybooker.toml`
//! - `./storybooker.toml`
//! - `STORYBOOKER__SECTION__KEY` environment variables
//! - Legacy variables: `LLM_PROVIDER`, `IMAGE_PROVIDER`, `LLM_TIMEOUT`,
//!   `IMAGE_TIMEOUT`, `DEFAULT_ART_STYLE`

use crate::{KeywordClassifier, RetryPolicy};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use storybooker_core::{ArtStyle, RequestLimits};
use storybooker_error::ConfigError;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../storybooker.toml");

/// Settings for one provider candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// Model identifier
    #[serde(default)]
    pub model: Option<String>,
    /// API base url
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the credential
    #[serde(default)]
    pub api_key_env: Option<String>,
}

/// Candidates and deadline for one capability kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CapabilityConfig {
    /// Candidate tried first
    pub preferred: String,
    /// Fixed fallback ordering
    pub fallback_order: Vec<String>,
    /// Per-attempt deadline in seconds
    pub timeout_secs: u64,
    /// Per-provider settings keyed by provider name
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
}

impl CapabilityConfig {
    /// Per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settings for `name`, empty when not configured.
    pub fn provider(&self, name: &str) -> ProviderSettings {
        self.providers.get(name).cloned().unwrap_or_default()
    }
}

/// Rate-limit keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Phrases marking a response as rate limited
    pub rate_limit_keywords: Vec<String>,
}

impl ClassifierConfig {
    /// Classifier over the configured keywords.
    pub fn classifier(&self) -> KeywordClassifier {
        KeywordClassifier::new(&self.rate_limit_keywords)
    }
}

/// Job limits and defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobConfig {
    /// Languages the service can write
    pub supported_languages: Vec<String>,
    /// Languages used when a request names none
    pub default_languages: Vec<String>,
    /// Largest accepted page count
    pub max_pages: u8,
    /// Style used when a request names none
    pub default_style: ArtStyle,
    /// Beats processed concurrently in prompt and image phases
    pub beat_concurrency: usize,
}

impl JobConfig {
    /// Limits applied to submitted requests.
    pub fn limits(&self) -> RequestLimits {
        RequestLimits {
            supported_languages: self.supported_languages.clone(),
            default_languages: self.default_languages.clone(),
            max_pages: self.max_pages,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Persistent character store root
    pub characters_dir: PathBuf,
    /// Per-job generated images
    pub assets_dir: PathBuf,
    /// Finished documents
    pub output_dir: PathBuf,
}

/// HTTP surface settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address
    pub addr: String,
}

/// Image post-processing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostProcessingConfig {
    /// Background threshold for cutouts
    pub threshold: u8,
    /// Margin kept around cutouts
    pub padding: u32,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Emit JSON lines
    pub json: bool,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorybookerConfig {
    /// Text generation candidates
    pub text: CapabilityConfig,
    /// Image generation candidates
    pub image: CapabilityConfig,
    /// Transient retry policy
    pub retry: RetryPolicy,
    /// Failure classifier keywords
    pub classifier: ClassifierConfig,
    /// Job limits
    pub job: JobConfig,
    /// Filesystem locations
    pub paths: PathsConfig,
    /// HTTP surface
    pub server: ServerConfig,
    /// Post-processing
    pub post_processing: PostProcessingConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl StorybookerConfig {
    fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Bundled defaults only.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::finish(Self::defaults())
    }

    /// Bundled defaults overlaid with a TOML document.
    pub fn from_toml_str(overrides: &str) -> Result<Self, ConfigError> {
        Self::finish(Self::defaults().add_source(File::from_str(overrides, FileFormat::Toml)))
    }

    /// Load from every source.
    #[instrument]
    pub fn load() -> Result<Self, ConfigError> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder = Self::defaults();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/storybooker/storybooker.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("storybooker").required(false))
            .add_source(
                Environment::with_prefix("STORYBOOKER")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config = Self::finish(builder)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the legacy single-variable overrides.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("LLM_PROVIDER") {
            debug!(provider = %provider, "Text provider overridden from environment");
            self.text.preferred = provider.trim().to_lowercase();
        }
        if let Some(provider) = lookup("IMAGE_PROVIDER") {
            debug!(provider = %provider, "Image provider overridden from environment");
            self.image.preferred = provider.trim().to_lowercase();
        }
        if let Some(secs) = lookup("LLM_TIMEOUT") {
            self.text.timeout_secs = parse_secs("LLM_TIMEOUT", &secs)?;
        }
        if let Some(secs) = lookup("IMAGE_TIMEOUT") {
            self.image.timeout_secs = parse_secs("IMAGE_TIMEOUT", &secs)?;
        }
        if let Some(style) = lookup("DEFAULT_ART_STYLE") {
            self.job.default_style = ArtStyle::from_str(style.trim()).map_err(|_| {
                ConfigError::new(format!("DEFAULT_ART_STYLE '{}' is not a known style", style))
            })?;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, capability) in [("text", &self.text), ("image", &self.image)] {
            if capability.fallback_order.is_empty() {
                return Err(ConfigError::new(format!(
                    "[{}] fallback_order must name at least one provider",
                    label
                )));
            }
            if capability.timeout_secs == 0 {
                return Err(ConfigError::new(format!(
                    "[{}] timeout_secs must be positive",
                    label
                )));
            }
        }
        if self.job.max_pages == 0 {
            return Err(ConfigError::new("[job] max_pages must be positive"));
        }
        if self.job.beat_concurrency == 0 {
            return Err(ConfigError::new("[job] beat_concurrency must be positive"));
        }
        if let Some(missing) = self
            .job
            .default_languages
            .iter()
            .find(|l| !self.job.supported_languages.contains(l))
        {
            return Err(ConfigError::new(format!(
                "[job] default language '{}' is not in supported_languages",
                missing
            )));
        }
        Ok(())
    }
}

fn parse_secs(name: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::new(format!(
            "{} must be a positive number of seconds, got '{}'",
            name, value
        ))),
    }
}
