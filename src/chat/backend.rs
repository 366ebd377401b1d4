//! HTTP client for the conversational backend
//!
//! Posts (user text, speaker name) to the configured endpoint. The call is
//! opaque-success: the assistant's reply arrives later over the comment
//! stream, so the response body is discarded.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Global HTTP client for reuse across requests (avoids TLS handshake overhead)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Errors that can occur when calling the conversational backend
#[derive(Debug)]
pub enum BackendError {
    /// Backend endpoint not configured
    MissingEndpoint,
    /// Network/HTTP error
    NetworkError(String),
    /// Backend returned an error status
    ApiError { status: u16, message: String },
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::MissingEndpoint => {
                write!(
                    f,
                    "Chat backend not configured. Set AVATAR_CHAT_API_URL environment variable."
                )
            }
            BackendError::NetworkError(e) => write!(f, "Network error: {}", e),
            BackendError::ApiError { status, message } => {
                write!(f, "Chat backend error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    content: &'a str,
    your_name: &'a str,
}

/// Backend error response body, when it bothers to send one
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Check if a backend endpoint is configured (for status display)
pub fn is_backend_configured(endpoint: Option<&str>) -> bool {
    endpoint.map(|e| !e.is_empty()).unwrap_or(false)
}

/// Forward a user submission to the conversational backend.
///
/// # Arguments
/// * `endpoint` - Backend URL, if configured
/// * `content` - The user's message text
/// * `speaker_name` - Resolved display name of the speaker
///
/// # Returns
/// * `Ok(())` - The backend accepted the submission
/// * `Err(BackendError)` - Configuration, network, or API failure
pub async fn send_chat(
    endpoint: Option<&str>,
    content: &str,
    speaker_name: &str,
) -> Result<(), BackendError> {
    let endpoint = match endpoint {
        Some(url) if !url.is_empty() => url,
        _ => return Err(BackendError::MissingEndpoint),
    };

    let request = ChatRequest {
        content,
        your_name: speaker_name,
    };

    log::debug!("chat backend: sending {} chars as '{}'", content.len(), speaker_name);

    let response = get_http_client()
        .post(endpoint)
        .json(&request)
        .send()
        .await
        .map_err(|e| BackendError::NetworkError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|r| r.error.message)
            .unwrap_or(body);
        return Err(BackendError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    // Opaque success: the reply arrives over the comment stream.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_backend_configured() {
        assert!(!is_backend_configured(None));
        assert!(!is_backend_configured(Some("")));
        assert!(is_backend_configured(Some("http://localhost:3000/chat")));
    }

    #[tokio::test]
    async fn test_missing_endpoint_error() {
        let result = send_chat(None, "hello", "Alice").await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), BackendError::MissingEndpoint));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let result = send_chat(Some("http://127.0.0.1:9/chat"), "hello", "Alice").await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), BackendError::NetworkError(_)));
    }

    #[test]
    fn test_error_display_formats_correctly() {
        let errors = vec![
            (BackendError::MissingEndpoint, "AVATAR_CHAT_API_URL"),
            (
                BackendError::NetworkError("connection refused".to_string()),
                "connection refused",
            ),
            (
                BackendError::ApiError {
                    status: 500,
                    message: "internal error".to_string(),
                },
                "500",
            ),
        ];

        for (err, expected_substring) in errors {
            let display = err.to_string();
            assert!(
                display.contains(expected_substring),
                "Error display '{}' should contain '{}'",
                display,
                expected_substring
            );
        }
    }
}
