//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use storybooker_error::{
    JobErrorKind, ServerError, ServerErrorKind, StorybookerError, StorybookerErrorKind,
};
use tracing::error;

/// A [`StorybookerError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(StorybookerError);

impl ApiError {
    /// 404 with `what` as the message.
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self(ServerError::new(ServerErrorKind::NotFound(what.into())).into())
    }

    /// 409 with `reason` as the message.
    #[track_caller]
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self(ServerError::new(ServerErrorKind::Conflict(reason.into())).into())
    }

    /// 400 with `reason` as the message.
    #[track_caller]
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self(ServerError::new(ServerErrorKind::BadRequest(reason.into())).into())
    }

    /// Status code for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            StorybookerErrorKind::Server(e) => match e.kind {
                ServerErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
                ServerErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
                ServerErrorKind::Conflict(_) => StatusCode::CONFLICT,
                ServerErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            StorybookerErrorKind::Job(e) if e.kind == JobErrorKind::ContractViolation => {
                StatusCode::BAD_REQUEST
            }
            StorybookerErrorKind::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Server failures are only described in logs.
    fn message(&self) -> String {
        if self.status().is_server_error() {
            return "internal server error".to_string();
        }
        match self.0.kind() {
            StorybookerErrorKind::Server(e) => e.kind.to_string(),
            StorybookerErrorKind::Job(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<StorybookerError> for ApiError {
    fn from(err: StorybookerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storybooker_error::{StorageError, StorageErrorKind};

    #[test]
    fn test_server_failures_hide_details() {
        let err = ApiError::from(StorybookerError::from(StorageError::new(
            StorageErrorKind::FileRead("/srv/secret: denied".into()),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "internal server error");
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = ApiError::conflict("job 'x' is processing");
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.message().contains("processing"));
    }
}
