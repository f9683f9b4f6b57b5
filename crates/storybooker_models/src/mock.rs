//! Deterministic offline providers.
//!
//! `mock` is a real candidate in the default fallback order, so the service
//! can finish a job without network access. The same types drive tests via
//! scripted [`MockBehavior`]s.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storybooker_core::{
    Character, ImageRequest, ImageResponse, TextRequest, TextResponse,
};
use storybooker_error::{CapabilityKind, ProviderError, ProviderErrorKind};
use storybooker_interface::{ImageGenerator, ProviderCandidate, TextGenerator};
use tracing::{debug, instrument};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The generator's own deterministic output
    Generated,
    /// Fixed text (text generator only)
    Text(String),
    /// Fail with this error
    Error(ProviderErrorKind),
    /// Sleep, then produce the generated output
    Delay(Duration),
}

/// How a mock provider behaves across calls.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always produce generated output
    Success,
    /// Always fail with the error
    Error(ProviderErrorKind),
    /// Fail `fail_count` times, then succeed
    FailThenSucceed {
        /// Failures before the first success
        fail_count: usize,
        /// Error returned while failing
        error: ProviderErrorKind,
    },
    /// Replies in order, generated output once exhausted
    Sequence(Vec<MockResponse>),
}

#[derive(Debug)]
struct MockState<R> {
    calls: usize,
    requests: Vec<R>,
}

impl<R> Default for MockState<R> {
    fn default() -> Self {
        Self {
            calls: 0,
            requests: Vec::new(),
        }
    }
}

fn next_response(behavior: &MockBehavior, call: usize) -> MockResponse {
    match behavior {
        MockBehavior::Success => MockResponse::Generated,
        MockBehavior::Error(kind) => MockResponse::Error(kind.clone()),
        MockBehavior::FailThenSucceed { fail_count, error } => {
            if call < *fail_count {
                MockResponse::Error(error.clone())
            } else {
                MockResponse::Generated
            }
        }
        MockBehavior::Sequence(steps) => steps.get(call).cloned().unwrap_or(MockResponse::Generated),
    }
}

/// Value of a `Key: value` line in a prompt.
fn prompt_field<'a>(prompt: &'a str, key: &str) -> Option<&'a str> {
    prompt.lines().find_map(|line| {
        let (k, v) = line.trim().split_once(':')?;
        k.trim().eq_ignore_ascii_case(key).then(|| v.trim())
    })
}

/// `N` from the first "exactly N" in a prompt.
fn requested_count(prompt: &str) -> Option<usize> {
    let lower = prompt.to_lowercase();
    let (_, rest) = lower.split_once("exactly ")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Deterministic text provider.
#[derive(Debug, Clone)]
pub struct MockTextGenerator {
    name: String,
    behavior: MockBehavior,
    beat_count: Option<usize>,
    characters: Vec<Character>,
    replies: HashMap<String, String>,
    state: Arc<Mutex<MockState<TextRequest>>>,
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockTextGenerator {
    /// Always-successful generator registered under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: MockBehavior::Success,
            beat_count: None,
            characters: vec![
                Character::new("Pip")
                    .with_species("sparrow")
                    .with_description("A small brown sparrow with a bright red scarf")
                    .with_features(["red scarf", "tiny satchel", "speckled wings"]),
            ],
            replies: HashMap::new(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Replace the behavior.
    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Always write this many beats, whatever was asked for.
    pub fn with_beat_count(mut self, beats: usize) -> Self {
        self.beat_count = Some(beats);
        self
    }

    /// Reply `text` to every request labelled `label`.
    pub fn with_reply(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.replies.insert(label.into(), text.into());
        self
    }

    /// Characters returned for extraction requests.
    pub fn with_characters(mut self, characters: Vec<Character>) -> Self {
        self.characters = characters;
        self
    }

    /// Number of calls so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().map(|s| s.calls).unwrap_or(0)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<TextRequest> {
        self.state
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    fn story(&self, prompt: &str) -> String {
        let pages = self
            .beat_count
            .or_else(|| requested_count(prompt))
            .unwrap_or(5);
        let theme = prompt_field(prompt, "Theme").unwrap_or("adventure");
        let language = prompt_field(prompt, "Language").unwrap_or("en");
        let hero = self.characters.first().map(|c| c.name.as_str()).unwrap_or("Pip");

        let beats: Vec<_> = (1..=pages)
            .map(|page| {
                let text = match language {
                    "es" => format!("Página {}: {} sigue su aventura de {}.", page, hero, theme),
                    _ => format!("Page {}: {} continues the {} adventure.", page, hero, theme),
                };
                json!({
                    "text": text,
                    "visual_description": format!("{} exploring scene {} of the {} story", hero, page, theme),
                    "sticker_subjects": [hero],
                })
            })
            .collect();

        let title = match language {
            "es" => format!("La aventura de {}", hero),
            _ => format!("{} and the {}", hero, theme),
        };
        json!({ "title": title, "beats": beats }).to_string()
    }

    fn characters_json(&self) -> String {
        json!({ "characters": self.characters }).to_string()
    }

    fn art_direction(&self, prompt: &str) -> String {
        let subjects: Vec<&str> = prompt_field(prompt, "Subjects")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let scene = prompt_field(prompt, "Scene").unwrap_or("a storybook landscape");
        let prompts: Vec<_> = subjects
            .iter()
            .map(|subject| json!({ "subject": subject, "prompt": format!("sticker of {}, clean white background", subject) }))
            .collect();
        json!({
            "prompts": prompts,
            "background_prompt": format!("full page illustration of {}", scene),
        })
        .to_string()
    }

    fn generated(&self, req: &TextRequest) -> String {
        if let Some(reply) = self.replies.get(&req.label) {
            return reply.clone();
        }
        let prompt = req.prompt_text();
        match req.label.as_str() {
            "story" => self.story(&prompt),
            "characters" => self.characters_json(),
            "art_direction" => self.art_direction(&prompt),
            _ => json!({ "text": format!("mock reply for {}", req.label) }).to_string(),
        }
    }
}

impl ProviderCandidate for MockTextGenerator {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        "mock-story-v1"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::TextGeneration
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    #[instrument(skip(self, req), fields(provider = %self.name, label = %req.label))]
    async fn generate(&self, req: &TextRequest) -> Result<TextResponse, ProviderError> {
        let call = {
            let mut state = self.state.lock().map_err(|_| {
                ProviderError::new(ProviderErrorKind::Unavailable("mock state poisoned".into()))
            })?;
            state.calls += 1;
            state.requests.push(req.clone());
            state.calls - 1
        };

        let text = match next_response(&self.behavior, call) {
            MockResponse::Generated => self.generated(req),
            MockResponse::Text(text) => text,
            MockResponse::Error(kind) => return Err(ProviderError::new(kind)),
            MockResponse::Delay(delay) => {
                tokio::time::sleep(delay).await;
                self.generated(req)
            }
        };
        debug!(call, chars = text.len(), "Mock text reply");

        Ok(TextResponse {
            text,
            provider: self.name.clone(),
            model: self.model_name().to_string(),
        })
    }
}

/// Deterministic image provider producing small solid-colour PNGs.
#[derive(Debug, Clone)]
pub struct MockImageGenerator {
    name: String,
    behavior: MockBehavior,
    state: Arc<Mutex<MockState<ImageRequest>>>,
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockImageGenerator {
    /// Always-successful generator registered under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: MockBehavior::Success,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Replace the behavior.
    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Number of calls so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().map(|s| s.calls).unwrap_or(0)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ImageRequest> {
        self.state
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    /// PNG whose colour is derived from the prompt and seed.
    pub fn render(req: &ImageRequest) -> Result<Vec<u8>, ProviderError> {
        let mut hasher = Sha256::new();
        hasher.update(req.prompt.as_bytes());
        if let Some(seed) = req.seed {
            hasher.update(seed.to_be_bytes());
        }
        let digest = hasher.finalize();
        let color = Rgb([digest[0], digest[1], digest[2]]);

        let width = (req.width / 16).max(8);
        let height = (req.height / 16).max(8);
        let image = RgbImage::from_pixel(width, height, color);

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                    "mock PNG encoding failed: {}",
                    e
                )))
            })?;
        Ok(bytes)
    }
}

impl ProviderCandidate for MockImageGenerator {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        "mock-image-v1"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::ImageGeneration
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    #[instrument(skip(self, req), fields(provider = %self.name, label = %req.label))]
    async fn generate_image(&self, req: &ImageRequest) -> Result<ImageResponse, ProviderError> {
        let call = {
            let mut state = self.state.lock().map_err(|_| {
                ProviderError::new(ProviderErrorKind::Unavailable("mock state poisoned".into()))
            })?;
            state.calls += 1;
            state.requests.push(req.clone());
            state.calls - 1
        };

        match next_response(&self.behavior, call) {
            MockResponse::Error(kind) => return Err(ProviderError::new(kind)),
            MockResponse::Delay(delay) => tokio::time::sleep(delay).await,
            MockResponse::Generated | MockResponse::Text(_) => {}
        }

        Ok(ImageResponse {
            bytes: Self::render(req)?,
            mime_type: "image/png".to_string(),
            provider: self.name.clone(),
        })
    }
}
