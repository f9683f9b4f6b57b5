//! Candidate construction from configuration.

use crate::{
    ApiKey, MockImageGenerator, MockTextGenerator, OpenAiCompatibleText, OpenAiImage,
    PollinationsImage,
};
use std::sync::Arc;
use storybooker_error::ConfigError;
use storybooker_interface::{ImageGenerator, TextGenerator};
use storybooker_resilience::{CapabilityConfig, ProviderSettings};
use tracing::{debug, info};

/// Built-in defaults: (model, base url, credential variable).
fn text_defaults(name: &str) -> Option<(&'static str, &'static str, Option<&'static str>)> {
    match name {
        "groq" => Some((
            "llama-3.3-70b-versatile",
            "https://api.groq.com/openai/v1",
            Some("GROQ_API_KEY"),
        )),
        "openai" => Some(("gpt-4o-mini", "https://api.openai.com/v1", Some("OPENAI_API_KEY"))),
        "local" => Some(("llama3.2", "http://localhost:11434/v1", None)),
        _ => None,
    }
}

fn image_defaults(name: &str) -> Option<(&'static str, &'static str, &'static str)> {
    match name {
        "pollinations" => Some((
            "flux",
            "https://enter.pollinations.ai/api/generate/image",
            "POLLINATIONS_API_KEY",
        )),
        "openai" => Some(("dall-e-3", "https://api.openai.com/v1", "OPENAI_API_KEY")),
        _ => None,
    }
}

/// Preferred provider followed by the fallback order, without duplicates.
fn candidate_names(config: &CapabilityConfig) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in config.fallback_order.iter().chain(std::iter::once(&config.preferred)) {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn api_key<F>(settings: &ProviderSettings, default_env: Option<&str>, lookup: &F) -> Option<ApiKey>
where
    F: Fn(&str) -> Option<String>,
{
    settings
        .api_key_env
        .as_deref()
        .or(default_env)
        .map(|env| ApiKey::from_lookup(env, lookup))
}

/// Text candidates for every configured provider name.
///
/// Unknown names with a `base_url` are treated as OpenAI-compatible servers.
pub fn build_text_candidates<F>(
    config: &CapabilityConfig,
    lookup: F,
) -> Result<Vec<Arc<dyn TextGenerator>>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut candidates: Vec<Arc<dyn TextGenerator>> = Vec::new();
    for name in candidate_names(config) {
        let settings = config.provider(&name);
        if name == "mock" {
            candidates.push(Arc::new(MockTextGenerator::new("mock")));
            continue;
        }

        let defaults = text_defaults(&name);
        let model = settings
            .model
            .clone()
            .or_else(|| defaults.map(|(model, _, _)| model.to_string()))
            .ok_or_else(|| {
                ConfigError::new(format!("Text provider '{}' needs a model", name))
            })?;
        let base_url = settings
            .base_url
            .clone()
            .or_else(|| defaults.map(|(_, url, _)| url.to_string()))
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "Unknown text provider '{}' (set a base_url to use an OpenAI-compatible server)",
                    name
                ))
            })?;
        let key = api_key(&settings, defaults.and_then(|(_, _, env)| env), &lookup);
        if key.as_ref().is_some_and(|k| !k.is_present()) {
            info!(provider = %name, "No credential present, provider will fail until one is set");
        }

        debug!(provider = %name, model = %model, base_url = %base_url, "Registering text candidate");
        candidates.push(Arc::new(OpenAiCompatibleText::new(
            name.clone(),
            model,
            &base_url,
            key,
        )?));
    }
    Ok(candidates)
}

/// Image candidates for every configured provider name.
pub fn build_image_candidates<F>(
    config: &CapabilityConfig,
    lookup: F,
) -> Result<Vec<Arc<dyn ImageGenerator>>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut candidates: Vec<Arc<dyn ImageGenerator>> = Vec::new();
    for name in candidate_names(config) {
        let settings = config.provider(&name);
        if name == "mock" {
            candidates.push(Arc::new(MockImageGenerator::new("mock")));
            continue;
        }

        let (default_model, default_url, default_env) = image_defaults(&name)
            .ok_or_else(|| ConfigError::new(format!("Unknown image provider '{}'", name)))?;
        let model = settings.model.clone().unwrap_or_else(|| default_model.to_string());
        let base_url = settings.base_url.clone().unwrap_or_else(|| default_url.to_string());
        let key = api_key(&settings, Some(default_env), &lookup).unwrap_or_default();

        debug!(provider = %name, model = %model, "Registering image candidate");
        let candidate: Arc<dyn ImageGenerator> = match name.as_str() {
            "pollinations" => Arc::new(PollinationsImage::new(model, &base_url, key)?),
            _ => Arc::new(OpenAiImage::new(model, &base_url, key)?),
        };
        candidates.push(candidate);
    }
    Ok(candidates)
}
