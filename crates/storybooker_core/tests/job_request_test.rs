use std::path::PathBuf;
use storybooker_core::{
    ArtStyle, DocumentHandle, JobId, JobRequest, JobRequestBuilder, JobSnapshot, JobStatus,
    RequestLimits,
};
use storybooker_error::JobErrorKind;

fn request(pages: u8, languages: &[&str]) -> JobRequest {
    JobRequestBuilder::default()
        .num_pages(pages)
        .languages(languages.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        .build()
        .expect("builder has defaults for every field")
}

#[test]
fn test_defaults_apply_when_languages_empty() {
    let normalized = request(3, &[]).normalized(&RequestLimits::default()).unwrap();
    assert_eq!(normalized.languages, vec!["en"]);
    assert_eq!(normalized.theme, "adventure");
    assert_eq!(normalized.style, None);
    assert_eq!(normalized.style_or(ArtStyle::Watercolor), ArtStyle::Watercolor);
}

#[test]
fn test_languages_deduplicated_in_order() {
    let normalized = request(2, &["es", " EN", "es", "en"])
        .normalized(&RequestLimits::default())
        .unwrap();
    assert_eq!(normalized.languages, vec!["es", "en"]);
}

#[test]
fn test_unsupported_language_rejected() {
    let err = request(2, &["en", "fr"])
        .normalized(&RequestLimits::default())
        .unwrap_err();
    assert_eq!(err.kind, JobErrorKind::ContractViolation);
    assert!(err.message.contains("'fr'"));
}

#[test]
fn test_page_count_bounds() {
    let limits = RequestLimits::default();
    assert!(request(0, &["en"]).normalized(&limits).is_err());
    assert!(request(11, &["en"]).normalized(&limits).is_err());
    assert!(request(10, &["en"]).normalized(&limits).is_ok());
    assert!(request(1, &["en"]).normalized(&limits).is_ok());
}

#[test]
fn test_request_deserializes_with_defaults() {
    let parsed: JobRequest =
        serde_json::from_str(r#"{"theme":"space","style":"3d_rendered"}"#).unwrap();
    assert_eq!(parsed.num_pages, 5);
    assert_eq!(parsed.style, Some(ArtStyle::ThreeDRendered));
    assert!(parsed.pinned_character_ids.is_empty());
}

#[test]
fn test_terminal_states() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
}

fn handle(language: &str) -> DocumentHandle {
    DocumentHandle {
        language: language.to_string(),
        path: PathBuf::from(format!("storybook_{}.html", language)),
        media_type: "text/html".to_string(),
        title: "Title".to_string(),
        page_count: 1,
    }
}

#[test]
fn test_primary_document_follows_request_order() {
    let mut snapshot = JobSnapshot::pending(JobId::new(), vec!["es".into(), "en".into()]);
    assert!(snapshot.primary_document().is_none());

    snapshot.outputs_by_language.insert("en".into(), handle("en"));
    assert_eq!(snapshot.primary_document().unwrap().language, "en");

    snapshot.outputs_by_language.insert("es".into(), handle("es"));
    assert_eq!(snapshot.primary_document().unwrap().language, "es");
}
