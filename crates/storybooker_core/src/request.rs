//! Request and response types for text and image generation.

use crate::Message;
use serde::{Deserialize, Serialize};

/// A text generation request.
///
/// The `label` names the purpose of the request (for example `story` or
/// `art_direction`). It is carried into tracing spans and lets offline
/// generators decide what document to return.
///
/// # Examples
///
/// ```
/// use storybooker_core::{Message, TextRequest};
///
/// let request = TextRequest::new("story", vec![Message::user("Once upon a time")])
///     .with_temperature(0.8)
///     .json();
///
/// assert!(request.json_response);
/// assert_eq!(request.temperature, Some(0.8));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextRequest {
    /// Purpose of the request
    pub label: String,
    /// The prompt messages
    pub messages: Vec<Message>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Ask the backend for a JSON object response
    pub json_response: bool,
}

impl TextRequest {
    /// Create a request with the given label and messages.
    pub fn new(label: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            label: label.into(),
            messages,
            ..Self::default()
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Request a JSON object response.
    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }

    /// All message text joined, used for prompt inspection.
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Text returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextResponse {
    /// Generated text
    pub text: String,
    /// Provider that produced the text
    pub provider: String,
    /// Model that produced the text
    pub model: String,
}

/// An image generation request.
///
/// # Examples
///
/// ```
/// use storybooker_core::ImageRequest;
///
/// let request = ImageRequest::new("cover", "a mouse in a teacup").with_seed(42);
/// assert_eq!(request.width, 1024);
/// assert_eq!(request.seed, Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Purpose of the request
    pub label: String,
    /// Image prompt
    pub prompt: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Seed for reproducible rendering
    pub seed: Option<u32>,
}

impl ImageRequest {
    /// Square 1024px request.
    pub fn new(label: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
            width: 1024,
            height: 1024,
            seed: None,
        }
    }

    /// Set the requested dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the rendering seed.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Image bytes returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub mime_type: String,
    /// Provider that produced the image
    pub provider: String,
}
