//! Shared HTTP helpers for provider clients.

use reqwest::{Client, Response};
use storybooker_error::{ConfigError, ProviderError, ProviderErrorKind};

/// HTTP client used by every provider.
///
/// Deadlines are owned by the invoker, so the client sets none.
pub fn client() -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(concat!("storybooker/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport failure.
pub fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::new(ProviderErrorKind::Transport(err.to_string()))
}

/// Turn a non-success response into a provider error, keeping the body.
pub async fn error_for_status(response: Response) -> Result<Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status_code = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
    Err(http_error(status_code, message))
}

/// Build an HTTP error, recognising OpenAI-style `model_not_found` bodies.
pub fn http_error(status_code: u16, message: String) -> ProviderError {
    let model_missing = message.contains("model_not_found")
        || (status_code == 404 && message.to_lowercase().contains("model"));
    if model_missing {
        ProviderError::new(ProviderErrorKind::ModelNotFound(message))
    } else {
        ProviderError::new(ProviderErrorKind::Http {
            status_code,
            message,
        })
    }
}
