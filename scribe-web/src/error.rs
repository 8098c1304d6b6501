//! HTTP error responses

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use scribe_core::ScribeError;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::error;

/// Errors a handler can return; each maps to one status code and a
/// `{ "error": code, "message": text }` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited { retry_after: Duration },

    #[error("An unexpected error occurred")]
    Internal { error_id: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::QuotaExceeded(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::QuotaExceeded(_) => "quota_exceeded",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Unexpected failure: log the details, expose only an id
    pub fn internal(message: impl std::fmt::Display) -> Self {
        let error_id = uuid::Uuid::new_v4().to_string();
        error!(error_id = %error_id, error = %message, "Unhandled error");
        ApiError::Internal { error_id }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match self {
            ApiError::RateLimited { retry_after } => {
                let retry_after_ms = retry_after.as_millis() as u64;
                let retry_after_secs = retry_after_ms.div_ceil(1000).max(1);
                let body = Json(json!({
                    "error": "rate_limited",
                    "message": format!(
                        "Too many requests. Try again in {} second{}.",
                        retry_after_secs,
                        if retry_after_secs == 1 { "" } else { "s" }
                    ),
                    "retryAfterMs": retry_after_ms,
                }));
                let mut response = (status, body).into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            ApiError::Internal { error_id } => (
                status,
                Json(json!({
                    "error": "internal_error",
                    "message": message,
                    "errorId": error_id,
                })),
            )
                .into_response(),
            other => (
                status,
                Json(json!({
                    "error": other.code(),
                    "message": message,
                })),
            )
                .into_response(),
        }
    }
}

impl From<ScribeError> for ApiError {
    fn from(error: ScribeError) -> Self {
        match error {
            ScribeError::Validation { message, .. } => ApiError::Validation(message),
            ScribeError::Authentication { message, .. } => ApiError::Unauthorized(message),
            ScribeError::QuotaExceeded { message, .. } => ApiError::QuotaExceeded(message),
            ScribeError::Conflict { message, .. } => ApiError::Conflict(message),
            ScribeError::NotFound { resource, .. } => {
                ApiError::NotFound(format!("{} not found", resource))
            }
            ScribeError::RateLimit { retry_after_ms, .. } => ApiError::RateLimited {
                retry_after: Duration::from_millis(retry_after_ms.unwrap_or(1000)),
            },
            other => {
                other.log();
                let error_id = other
                    .context()
                    .map(|c| c.error_id.clone())
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                ApiError::Internal { error_id }
            }
        }
    }
}

/// `Json` extractor whose rejections use the API error shape
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            ApiError::Validation(format!("Invalid request body: {}", e.body_text()))
        }
        JsonRejection::JsonSyntaxError(_) => {
            ApiError::Validation("Request body is not valid JSON".to_string())
        }
        JsonRejection::MissingJsonContentType(_) => ApiError::Validation(
            "Expected a JSON body with Content-Type: application/json".to_string(),
        ),
        other => ApiError::Validation(other.body_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use scribe_core::{validation_error, ErrorContext};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let response = ApiError::RateLimited {
            retry_after: Duration::from_millis(1500),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "2");

        let body = body_json(response).await;
        assert_eq!(body["error"], "rate_limited");
        assert_eq!(body["retryAfterMs"], 1500);
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let error: ApiError = ScribeError::Internal {
            message: "database password is hunter2".to_string(),
            source: None,
            context: ErrorContext::new("test"),
        }
        .into();

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "An unexpected error occurred");
        assert!(!body.to_string().contains("hunter2"));
        assert!(body["errorId"].is_string());
    }

    #[test]
    fn test_scribe_error_mapping() {
        let error: ApiError = validation_error!("Topic too short", "topic", "test").into();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "Topic too short");

        let conflict: ApiError = ScribeError::Conflict {
            message: "Email already registered".to_string(),
            context: ErrorContext::new("test"),
        }
        .into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
    }
}
