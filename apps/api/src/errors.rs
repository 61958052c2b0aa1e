use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Too many requests, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Document generation failed even after the fallback. `details` is only
    /// populated in development mode.
    #[error("{message}")]
    Render {
        message: String,
        details: Option<String>,
    },

    #[error("{0}")]
    Ai(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: Vec<FieldError>) -> Self {
        let message = match details.as_slice() {
            [only] => only.message.clone(),
            _ => "Invalid request".to_string(),
        };
        AppError::Validation { message, details }
    }

    /// Logs `source` and wraps it; the chain reaches the client only when
    /// `expose` is set.
    pub fn render(message: &str, source: &dyn std::error::Error, expose: bool) -> Self {
        tracing::error!(error = %source, "{message}");
        AppError::Render {
            message: message.to_string(),
            details: expose.then(|| error_chain(source)),
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        parts.push(cause.to_string());
        current = cause.source();
    }
    parts.join(": ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": message,
                    "code": "VALIDATION_ERROR",
                    "details": details,
                })),
            )
                .into_response(),
            AppError::RateLimited { retry_after } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "success": false,
                        "error": "Too many requests, please try again later.",
                        "code": "RATE_LIMITED",
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                response
            }
            AppError::Render { message, details } => {
                let mut body = json!({
                    "success": false,
                    "error": message,
                    "code": "RENDER_ERROR",
                });
                if let Some(details) = details {
                    body["details"] = json!(details);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            AppError::Ai(message) => {
                tracing::error!("AI error: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": message,
                        "code": "AI_ERROR",
                    })),
                )
                    .into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "An internal server error occurred",
                        "code": "INTERNAL_ERROR",
                    })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_shape() {
        let response =
            AppError::validation(vec![FieldError::new("cvData", "cvData must be an object")])
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "cvData must be an object");
        assert_eq!(body["details"][0]["field"], "cvData");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[tokio::test]
    async fn test_render_details_only_when_exposed() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "disk full");

        let hidden = AppError::render("Failed to generate PDF", &source, false).into_response();
        assert_eq!(hidden.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(hidden).await;
        assert_eq!(body["code"], "RENDER_ERROR");
        assert!(body.get("details").is_none());

        let shown = AppError::render("Failed to generate PDF", &source, true).into_response();
        let body = body_json(shown).await;
        assert_eq!(body["details"], "disk full");
    }
}
