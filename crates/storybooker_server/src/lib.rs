//! HTTP surface for Storybooker.
//!
//! | Route | Result |
//! |---|---|
//! | `GET /health` | `{"status": "ok"}` |
//! | `POST /generate` | 202 with `{"job_id": ...}` |
//! | `GET /status/{job_id}` | the job snapshot |
//! | `GET /download/{job_id}?language=xx` | document bytes once completed |
//! | `GET /characters` | stored characters |

#![warn(missing_docs)]

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{AppState, create_router};

use storybooker_error::{ServerError, ServerErrorKind, StorybookerResult};
use tracing::info;

/// Bind `addr` and serve until the process stops.
pub async fn serve(addr: &str, state: AppState) -> StorybookerResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        ServerError::new(ServerErrorKind::Internal(format!(
            "could not bind {}: {}",
            addr, e
        )))
    })?;
    info!(addr, "Storybooker listening");

    axum::serve(listener, create_router(state))
        .await
        .map_err(|e| ServerError::new(ServerErrorKind::Internal(e.to_string())))?;
    Ok(())
}
