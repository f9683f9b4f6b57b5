//! Pollinations image generation.

use crate::ApiKey;
use crate::http::{client, error_for_status, transport};
use async_trait::async_trait;
use reqwest::{Client, Url};
use storybooker_core::{ImageRequest, ImageResponse};
use storybooker_error::{CapabilityKind, ConfigError, ProviderError, ProviderErrorKind};
use storybooker_interface::{ImageGenerator, ProviderCandidate};
use tracing::{debug, instrument};

/// Pollinations client.
///
/// The prompt travels as the last path segment; the service answers with
/// raw image bytes, or a text body when it refuses the request.
#[derive(Debug, Clone)]
pub struct PollinationsImage {
    client: Client,
    model: String,
    base_url: Url,
    api_key: ApiKey,
}

impl PollinationsImage {
    /// Client for `base_url` rendering with `model`.
    pub fn new(
        model: impl Into<String>,
        base_url: &str,
        api_key: ApiKey,
    ) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ConfigError::new(format!("Invalid pollinations base url '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::new(format!(
                "Pollinations base url '{}' cannot take a path",
                base_url
            )));
        }
        Ok(Self {
            client: client()?,
            model: model.into(),
            base_url,
            api_key,
        })
    }

    /// Full url for a request.
    pub fn request_url(&self, req: &ImageRequest) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::new(ProviderErrorKind::UnsupportedRequest(
                    "base url cannot take a path".to_string(),
                ))
            })?
            .pop_if_empty()
            .push(&req.prompt);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("model", &self.model)
                .append_pair("width", &req.width.to_string())
                .append_pair("height", &req.height.to_string())
                .append_pair("nologo", "true");
            if let Some(seed) = req.seed {
                query.append_pair("seed", &seed.to_string());
            }
        }
        Ok(url)
    }
}

impl ProviderCandidate for PollinationsImage {
    fn provider_name(&self) -> &str {
        "pollinations"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::ImageGeneration
    }
}

#[async_trait]
impl ImageGenerator for PollinationsImage {
    #[instrument(skip(self, req), fields(provider = "pollinations", model = %self.model, label = %req.label))]
    async fn generate_image(&self, req: &ImageRequest) -> Result<ImageResponse, ProviderError> {
        let key = self.api_key.require()?;
        let url = self.request_url(req)?;

        debug!(width = req.width, height = req.height, seed = ?req.seed, "Requesting image");
        let response = self
            .client
            .get(url)
            .bearer_auth(key)
            .send()
            .await
            .map_err(transport)?;
        let response = error_for_status(response).await?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !mime_type.starts_with("image/") {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "expected an image, got '{}': {}",
                mime_type, body
            ))));
        }

        let bytes = response.bytes().await.map_err(transport)?.to_vec();
        debug!(size = bytes.len(), mime = %mime_type, "Image received");
        Ok(ImageResponse {
            bytes,
            mime_type,
            provider: "pollinations".to_string(),
        })
    }
}
