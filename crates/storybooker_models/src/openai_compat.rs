//! Text generation over OpenAI-compatible chat completion APIs.
//!
//! Groq, OpenAI and local servers (Ollama, GPT4All) share this wire format
//! and differ only in base url, model and credential.

use crate::ApiKey;
use crate::http::{client, error_for_status, transport};
use async_trait::async_trait;
use derive_builder::Builder;
use derive_getters::Getters;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storybooker_core::{Role, TextRequest, TextResponse};
use storybooker_error::{
    CapabilityKind, ConfigError, FailureClass, ProviderError, ProviderErrorKind,
};
use storybooker_interface::{ProviderCandidate, TextGenerator};
use tracing::{debug, instrument};

/// Chat message on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ChatMessage {
    role: String,
    content: String,
}

/// `response_format` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

/// Chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Convert a text request to the wire body.
pub fn to_chat_request(
    model: &str,
    req: &TextRequest,
) -> Result<ChatCompletionRequest, ProviderError> {
    let messages = req
        .messages
        .iter()
        .map(|m| ChatMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            }
            .to_string(),
            content: m.content.clone(),
        })
        .collect::<Vec<_>>();

    ChatCompletionRequestBuilder::default()
        .model(model)
        .messages(messages)
        .temperature(req.temperature)
        .max_tokens(req.max_tokens)
        .response_format(req.json_response.then(|| ResponseFormat {
            kind: "json_object".to_string(),
        }))
        .build()
        .map_err(|e| {
            ProviderError::new(ProviderErrorKind::UnsupportedRequest(format!(
                "Failed to build chat request: {}",
                e
            )))
        })
}

/// OpenAI-compatible chat completion client.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleText {
    client: Client,
    provider: String,
    model: String,
    endpoint: String,
    api_key: Option<ApiKey>,
}

impl OpenAiCompatibleText {
    /// Client for `provider` at `base_url`.
    ///
    /// `api_key` of `None` means the server needs no credential.
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        api_key: Option<ApiKey>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: client()?,
            provider: provider.into(),
            model: model.into(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Completion endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ProviderCandidate for OpenAiCompatibleText {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::TextGeneration
    }

    /// A credential-less server that refuses connections is not running, so
    /// retrying it is pointless.
    fn classify_failure(&self, err: &ProviderError) -> Option<FailureClass> {
        match err.kind {
            ProviderErrorKind::Transport(_) if self.api_key.is_none() => {
                Some(FailureClass::Unsupported)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleText {
    #[instrument(skip(self, req), fields(provider = %self.provider, model = %self.model, label = %req.label))]
    async fn generate(&self, req: &TextRequest) -> Result<TextResponse, ProviderError> {
        let body = to_chat_request(&self.model, req)?;

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.require()?);
        }

        debug!(endpoint = %self.endpoint, "Sending chat completion request");
        let response = request.send().await.map_err(transport)?;
        let response = error_for_status(response).await?;

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "Failed to parse chat completion: {}",
                e
            )))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::InvalidResponse(
                    "Chat completion contained no content".to_string(),
                ))
            })?;

        debug!(chars = text.len(), "Chat completion received");
        Ok(TextResponse {
            text,
            provider: self.provider.clone(),
            model: self.model.clone(),
        })
    }
}
