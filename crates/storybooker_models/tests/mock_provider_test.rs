//! Tests for the offline mock providers.

use std::time::Duration;
use storybooker_core::{ImageRequest, Message, TextRequest};
use storybooker_error::ProviderErrorKind;
use storybooker_interface::{ImageGenerator, ProviderCandidate, TextGenerator};
use storybooker_models::{MockBehavior, MockImageGenerator, MockResponse, MockTextGenerator};

fn story_request(prompt: &str) -> TextRequest {
    TextRequest::new("story", vec![Message::user(prompt)]).json()
}

#[tokio::test]
async fn test_story_honours_requested_page_count() {
    let mock = MockTextGenerator::default();
    let reply = mock
        .generate(&story_request("Theme: the sea\nLanguage: en\nWrite exactly 3 pages."))
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&reply.text).unwrap();
    assert_eq!(value["beats"].as_array().unwrap().len(), 3);
    assert!(value["beats"][0]["text"].as_str().unwrap().contains("the sea"));
    assert_eq!(reply.provider, "mock");
}

#[tokio::test]
async fn test_story_language_and_override() {
    let mock = MockTextGenerator::default().with_beat_count(2);
    let reply = mock
        .generate(&story_request("Theme: a forest\nLanguage: es\nWrite exactly 5 pages."))
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&reply.text).unwrap();
    let beats = value["beats"].as_array().unwrap();
    assert_eq!(beats.len(), 2);
    assert!(beats[0]["text"].as_str().unwrap().starts_with("Página"));
}

#[tokio::test]
async fn test_art_direction_uses_subject_line() {
    let mock = MockTextGenerator::default();
    let req = TextRequest::new(
        "art_direction",
        vec![Message::user("Scene: a meadow\nSubjects: Pip, a red kite")],
    );
    let value: serde_json::Value =
        serde_json::from_str(&mock.generate(&req).await.unwrap().text).unwrap();

    let prompts = value["prompts"].as_array().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[1]["subject"], "a red kite");
    assert!(value["background_prompt"].as_str().unwrap().contains("meadow"));
}

#[tokio::test]
async fn test_scripted_reply_wins() {
    let mock = MockTextGenerator::default().with_reply("story", "not json");
    let reply = mock.generate(&story_request("anything")).await.unwrap();
    assert_eq!(reply.text, "not json");
}

#[tokio::test]
async fn test_fail_then_succeed_counts_calls() {
    let mock = MockTextGenerator::new("groq").with_behavior(MockBehavior::FailThenSucceed {
        fail_count: 2,
        error: ProviderErrorKind::Unavailable("busy".into()),
    });
    let req = story_request("exactly 1");

    assert!(mock.generate(&req).await.is_err());
    assert!(mock.generate(&req).await.is_err());
    assert!(mock.generate(&req).await.is_ok());
    assert_eq!(mock.call_count(), 3);
    assert_eq!(mock.provider_name(), "groq");
}

#[tokio::test]
async fn test_image_is_decodable_png_and_deterministic() {
    let mock = MockImageGenerator::default();
    let req = ImageRequest::new("page_0", "a sparrow").with_seed(7);

    let first = mock.generate_image(&req).await.unwrap();
    let second = mock.generate_image(&req).await.unwrap();
    assert_eq!(first.mime_type, "image/png");
    assert_eq!(first.bytes, second.bytes);

    let decoded = image::load_from_memory(&first.bytes).unwrap();
    assert_eq!(decoded.width(), 64);
    assert_eq!(mock.requests()[0].seed, Some(7));
}

#[tokio::test]
async fn test_image_delay_then_error() {
    let mock = MockImageGenerator::new("pollinations").with_behavior(MockBehavior::Sequence(vec![
        MockResponse::Delay(Duration::from_millis(5)),
        MockResponse::Error(ProviderErrorKind::RateLimited("slow down".into())),
    ]));
    let req = ImageRequest::new("cover", "a castle");

    assert!(mock.generate_image(&req).await.is_ok());
    let err = mock.generate_image(&req).await.unwrap_err();
    assert!(matches!(err.kind, ProviderErrorKind::RateLimited(_)));
}
