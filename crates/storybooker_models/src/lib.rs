//! Text and image provider integrations.
//!
//! Every provider implements [`TextGenerator`](storybooker_interface::TextGenerator)
//! or [`ImageGenerator`](storybooker_interface::ImageGenerator) and raises
//! [`ProviderError`](storybooker_error::ProviderError)s that the invoker
//! classifies. Nothing in this crate retries.

#![warn(missing_docs)]

mod credentials;
mod factory;
mod http;
mod mock;
mod openai_compat;
mod openai_image;
mod pollinations;

pub use credentials::{ApiKey, is_placeholder};
pub use factory::{build_image_candidates, build_text_candidates};
pub use http::http_error;
pub use mock::{MockBehavior, MockImageGenerator, MockResponse, MockTextGenerator};
pub use openai_compat::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatMessage, OpenAiCompatibleText,
    ResponseFormat, to_chat_request,
};
pub use openai_image::{OpenAiImage, dalle_size};
pub use pollinations::PollinationsImage;
