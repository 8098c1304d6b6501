//! Shared HTTP plumbing for provider clients

use scribe_core::{ErrorContext, ResearchSettings, ScribeError, ScribeResult};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Longest slice of a provider error body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Create the HTTP client shared by all research providers
pub fn create_http_client(settings: &ResearchSettings) -> ScribeResult<reqwest::Client> {
    let user_agent =
        reqwest::header::HeaderValue::from_str(&settings.user_agent).map_err(|e| {
            ScribeError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(reqwest::header::USER_AGENT, user_agent);

    reqwest::Client::builder()
        .timeout(Duration::from_millis(settings.http_timeout_ms))
        .default_headers(headers)
        .build()
        .map_err(|e| ScribeError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

/// Send a request and decode a successful JSON response
pub async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> ScribeResult<T> {
    let response = request.send().await.map_err(|e| ScribeError::Provider {
        provider: provider.to_string(),
        message: format!("Request failed: {}", e),
        status: None,
        source: Some(Box::new(e)),
        context: ErrorContext::new(provider).with_operation("send"),
    })?;

    debug!(provider, status = response.status().as_u16(), "Provider responded");

    if !response.status().is_success() {
        return Err(handle_response_error(provider, response).await);
    }

    response.json::<T>().await.map_err(|e| ScribeError::Provider {
        provider: provider.to_string(),
        message: format!("Malformed payload: {}", e),
        status: None,
        source: Some(Box::new(e)),
        context: ErrorContext::new(provider).with_operation("decode"),
    })
}

/// Convert a non-success response into a provider error
pub async fn handle_response_error(provider: &str, response: reqwest::Response) -> ScribeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();

    ScribeError::Provider {
        provider: provider.to_string(),
        message: format!(
            "HTTP {}: {}",
            status.as_u16(),
            if body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error")
            } else {
                &body
            }
        ),
        status: Some(status.as_u16()),
        source: None,
        context: ErrorContext::new(provider)
            .with_operation("request")
            .with_suggestion(match status.as_u16() {
                401 | 403 => "Check the provider API key and its quota",
                429 => "Provider rate limit reached; try again later",
                _ => "Check network connectivity and provider status",
            }),
    }
}
