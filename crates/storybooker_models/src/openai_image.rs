//! OpenAI image generation (DALL-E 3).

use crate::ApiKey;
use crate::http::{client, error_for_status, transport};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storybooker_core::{ImageRequest, ImageResponse};
use storybooker_error::{CapabilityKind, ConfigError, ProviderError, ProviderErrorKind};
use storybooker_interface::{ImageGenerator, ProviderCandidate};
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'static str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    b64_json: Option<String>,
}

/// Nearest size DALL-E 3 accepts for the requested aspect.
pub fn dalle_size(width: u32, height: u32) -> &'static str {
    if width > height {
        "1792x1024"
    } else if height > width {
        "1024x1792"
    } else {
        "1024x1024"
    }
}

/// OpenAI images client.
///
/// DALL-E 3 has no seed parameter; seeds are ignored.
#[derive(Debug, Clone)]
pub struct OpenAiImage {
    client: Client,
    model: String,
    endpoint: String,
    api_key: ApiKey,
}

impl OpenAiImage {
    /// Client for `base_url` rendering with `model`.
    pub fn new(
        model: impl Into<String>,
        base_url: &str,
        api_key: ApiKey,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: client()?,
            model: model.into(),
            endpoint: format!("{}/images/generations", base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

impl ProviderCandidate for OpenAiImage {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::ImageGeneration
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImage {
    #[instrument(skip(self, req), fields(provider = "openai", model = %self.model, label = %req.label))]
    async fn generate_image(&self, req: &ImageRequest) -> Result<ImageResponse, ProviderError> {
        let key = self.api_key.require()?;
        let body = GenerationRequest {
            model: &self.model,
            prompt: &req.prompt,
            n: 1,
            size: dalle_size(req.width, req.height),
            response_format: "b64_json",
        };

        debug!(size = body.size, "Requesting image");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let response = error_for_status(response).await?;

        let parsed: GenerationResponse = response.json().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "Failed to parse image response: {}",
                e
            )))
        })?;

        let encoded = parsed
            .data
            .into_iter()
            .find_map(|image| image.b64_json)
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::InvalidResponse(
                    "Image response contained no data".to_string(),
                ))
            })?;
        let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "Image payload is not base64: {}",
                e
            )))
        })?;

        Ok(ImageResponse {
            bytes,
            mime_type: "image/png".to_string(),
            provider: "openai".to_string(),
        })
    }
}
