use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::AiError;
use crate::roadmap::normalizer::NormalizeError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("LLM error: {0}")]
    Ai(#[from] AiError),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Ai(e) => {
                tracing::error!("LLM error: {e}");
                match e {
                    AiError::RateLimited { .. } => (
                        StatusCode::TOO_MANY_REQUESTS,
                        "AI_RATE_LIMITED",
                        "The AI service is busy. Please wait a moment and try again.".to_string(),
                    ),
                    AiError::Auth { .. } => (
                        StatusCode::BAD_GATEWAY,
                        "AI_AUTH_ERROR",
                        "The AI service rejected our credentials.".to_string(),
                    ),
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "AI_UNAVAILABLE",
                        "The AI service could not be reached.".to_string(),
                    ),
                }
            }
            AppError::Normalize(e) => {
                tracing::warn!("Normalization error: {e}");
                let code = match e {
                    NormalizeError::Parse => "UNPARSEABLE_AI_RESPONSE",
                    NormalizeError::Shape(_) => "MALFORMED_ROADMAP",
                    NormalizeError::Empty => "EMPTY_ROADMAP",
                };
                (StatusCode::BAD_GATEWAY, code, e.user_message().to_string())
            }
            AppError::Store(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_errors_map_to_distinct_codes() {
        let codes: Vec<&str> = [
            NormalizeError::Parse,
            NormalizeError::Shape(vec![]),
            NormalizeError::Empty,
        ]
        .into_iter()
        .map(|e| AppError::from(e).parts().1)
        .collect();
        assert_eq!(
            codes,
            vec!["UNPARSEABLE_AI_RESPONSE", "MALFORMED_ROADMAP", "EMPTY_ROADMAP"]
        );
    }

    #[test]
    fn test_rate_limit_maps_to_429() {
        let err = AppError::from(AiError::RateLimited {
            message: "quota".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_ai_auth_hides_provider_message() {
        let err = AppError::from(AiError::Auth {
            status: 400,
            message: "API key not valid: AIza...".to_string(),
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "AI_AUTH_ERROR");
        assert!(!message.contains("AIza"));
    }

    #[test]
    fn test_unauthorized_is_401() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
