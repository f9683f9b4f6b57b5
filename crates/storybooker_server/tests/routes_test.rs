//! Router behaviour against an in-process registry.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use storybooker_characters::{FileSystemCharacterStore, InMemoryCharacterStore};
use storybooker_core::{ArtStyle, Character, JobId, RequestLimits};
use storybooker_interface::{CharacterStore, ThresholdConfig};
use storybooker_models::{MockBehavior, MockImageGenerator, MockResponse, MockTextGenerator};
use storybooker_pipeline::{CapabilityPool, JobRegistry, Services};
use storybooker_resilience::{Invoker, KeywordClassifier, RetryPolicy};
use storybooker_server::{AppState, create_router};
use storybooker_storage::{FileSystemAssetStore, HtmlDocumentAssembler, StandardPostProcessor};
use tempfile::TempDir;
use tower::ServiceExt;

fn state(dir: &TempDir, text: MockTextGenerator) -> AppState {
    let luna = Character::new("Luna").with_species("mouse");
    state_with_store(dir, text, Arc::new(InMemoryCharacterStore::with_characters([luna])))
}

fn state_with_store(
    dir: &TempDir,
    text: MockTextGenerator,
    characters: Arc<dyn CharacterStore>,
) -> AppState {
    let services = Services {
        text: CapabilityPool {
            candidates: vec![Arc::new(text)],
            preferred: None,
            timeout: Duration::from_secs(10),
        },
        image: CapabilityPool {
            candidates: vec![Arc::new(MockImageGenerator::default())],
            preferred: None,
            timeout: Duration::from_secs(10),
        },
        invoker: Invoker::new(RetryPolicy::no_retry(), Arc::new(KeywordClassifier::default())),
        characters,
        assets: Arc::new(FileSystemAssetStore::new(dir.path().join("assets")).unwrap()),
        post_processor: Arc::new(StandardPostProcessor::new()),
        assembler: Arc::new(HtmlDocumentAssembler::new(dir.path().join("output"))),
        limits: RequestLimits::default(),
        default_style: ArtStyle::Watercolor,
        beat_concurrency: 1,
        reference_cutout: ThresholdConfig::cutout(240, 10),
    };
    AppState::new(JobRegistry::new(Arc::new(services)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn submit(app: &Router, body: Value) -> JobId {
    let (status, bytes) = send(app, post_json("/generate", body)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let reply: Value = serde_json::from_slice(&bytes).unwrap();
    reply["job_id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = create_router(state(&dir, MockTextGenerator::default()));

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_generate_then_download() {
    let dir = TempDir::new().unwrap();
    let state = state(&dir, MockTextGenerator::default());
    let app = create_router(state.clone());

    let id = submit(&app, json!({"theme": "a snowy hill", "num_pages": 2, "languages": ["en"]})).await;
    let done = tokio::time::timeout(Duration::from_secs(30), state.registry().wait(id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status.to_string(), "completed");

    let (status, body) = send(&app, get(&format!("/status/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    let snapshot: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(snapshot["status"], "completed");
    assert_eq!(snapshot["progress"], 100);

    let response = app
        .clone()
        .oneshot(get(&format!("/download/{}?language=en", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&html).contains("<html lang=\"en\">"));

    let (status, _) = send(&app, get(&format!("/download/{}?language=es", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_before_completion_conflicts() {
    let dir = TempDir::new().unwrap();
    let slow = MockTextGenerator::default().with_behavior(MockBehavior::Sequence(vec![
        MockResponse::Delay(Duration::from_secs(5)),
    ]));
    let app = create_router(state(&dir, slow));

    let id = submit(&app, json!({"num_pages": 1})).await;
    let (status, body) = send(&app, get(&format!("/download/{}", id))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Conflict"));
}

#[tokio::test]
async fn test_unknown_jobs_are_not_found() {
    let dir = TempDir::new().unwrap();
    let app = create_router(state(&dir, MockTextGenerator::default()));

    let (status, _) = send(&app, get(&format!("/status/{}", JobId::new()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/status/not-a-job")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get(&format!("/download/{}", JobId::new()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let dir = TempDir::new().unwrap();
    let app = create_router(state(&dir, MockTextGenerator::default()));

    let (status, body) = send(&app, post_json("/generate", json!({"num_pages": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("num_pages"));

    let (status, _) = send(&app, post_json("/generate", json!({"languages": ["klingon"]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json("/generate", json!({"pinned_character_ids": ["chr_ghost"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lists_stored_characters() {
    let dir = TempDir::new().unwrap();
    let app = create_router(state(&dir, MockTextGenerator::default()));

    let (status, body) = send(&app, get("/characters")).await;

    assert_eq!(status, StatusCode::OK);
    let characters: Vec<Character> = serde_json::from_slice(&body).unwrap();
    assert_eq!(characters.len(), 1);
    assert_eq!(characters[0].name, "Luna");
}

#[tokio::test]
async fn test_malformed_pinned_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemCharacterStore::new(dir.path().join("characters")).unwrap();
    store
        .save(&Character::new("Luna").with_species("mouse"))
        .await
        .unwrap();
    let app = create_router(state_with_store(&dir, MockTextGenerator::default(), Arc::new(store)));

    for id in ["luna", "../etc"] {
        let (status, body) = send(
            &app,
            post_json("/generate", json!({"pinned_character_ids": [id]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {}", id);
        let body: Value = serde_json::from_slice(&body).unwrap();
        let message = body["error"].as_str().unwrap();
        assert!(message.contains(id));
        assert!(!message.contains(".rs"));
    }

    let id = submit(&app, json!({"num_pages": 1, "pinned_character_ids": ["chr_luna"]})).await;
    let (status, _) = send(&app, get(&format!("/status/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_download_defaults_to_primary_language() {
    let dir = TempDir::new().unwrap();
    let state = state(&dir, MockTextGenerator::default());
    let app = create_router(state.clone());

    let id = submit(&app, json!({"num_pages": 1, "languages": ["es", "en"]})).await;
    let done = tokio::time::timeout(Duration::from_secs(30), state.registry().wait(id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status.to_string(), "completed");
    assert_eq!(done.languages, vec!["es", "en"]);

    let response = app
        .clone()
        .oneshot(get(&format!("/download/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("storybook_es.html"));
    let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&html).contains("<html lang=\"es\">"));
}
