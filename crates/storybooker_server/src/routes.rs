//! Route handlers.

use crate::ApiError;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use storybooker_core::{Character, JobId, JobRequest, JobSnapshot, JobStatus};
use storybooker_pipeline::JobRegistry;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, instrument};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: JobRegistry,
}

impl AppState {
    /// State serving jobs from `registry`.
    pub fn new(registry: JobRegistry) -> Self {
        Self { registry }
    }

    /// Job registry.
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }
}

/// Build the HTTP router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/status/:job_id", get(status))
        .route("/download/:job_id", get(download))
        .route("/characters", get(list_characters))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(theme = %request.theme, pages = request.num_pages, "Generate request");
    let id = state.registry.submit(request).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": id }))))
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("job '{}'", raw)))
}

async fn snapshot(state: &AppState, raw: &str) -> Result<JobSnapshot, ApiError> {
    let id = parse_job_id(raw)?;
    state
        .registry
        .snapshot(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("job '{}'", raw)))
}

async fn status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    Ok(Json(snapshot(&state, &job_id).await?))
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    language: Option<String>,
}

#[instrument(skip_all)]
async fn download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let snapshot = snapshot(&state, &job_id).await?;
    if snapshot.status != JobStatus::Completed {
        return Err(ApiError::conflict(format!(
            "job '{}' is {}",
            job_id, snapshot.status
        )));
    }

    // Without a language, serve the primary edition.
    let document = match query.language.as_deref() {
        Some(language) => snapshot
            .outputs_by_language
            .get(&language.trim().to_lowercase()),
        None => snapshot.primary_document(),
    }
    .ok_or_else(|| {
        ApiError::not_found(format!(
            "no '{}' edition for job '{}'",
            query.language.as_deref().unwrap_or_default(),
            job_id
        ))
    })?;

    let bytes = tokio::fs::read(&document.path)
        .await
        .map_err(|_| ApiError::not_found(format!("document {}", document.path.display())))?;
    debug!(path = %document.path.display(), bytes = bytes.len(), "Serving document");

    let filename = document
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("storybook_{}.html", document.language));
    Ok((
        [
            (header::CONTENT_TYPE, document.media_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn list_characters(State(state): State<AppState>) -> Result<Json<Vec<Character>>, ApiError> {
    let characters = state.registry.services().characters.list().await?;
    Ok(Json(characters))
}
