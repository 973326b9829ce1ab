//! Centralized error handling module.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Application-wide error type.
///
/// All errors in the application should be converted to this type
/// for consistent error handling and reporting. Every variant maps to
/// one HTTP status code and a machine-readable error code rendered in
/// the `{"error": {code, message, status, details}}` envelope.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad request error (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized error (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden error (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found error (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (422), optionally with per-field details
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    /// Redis pool error
    #[error("Cache pool error: {0}")]
    RedisPool(#[from] deadpool_redis::PoolError),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error (for webhook delivery)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl AppError {
    /// Creates a validation error without field details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Machine-readable error code rendered in the error envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) | Self::Json(_) => "bad_request",
            Self::Unauthorized(_) | Self::Jwt(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation { .. } => "validation_failed",
            Self::Internal(_) => "internal_error",
            Self::Database(_) => "database_error",
            Self::Redis(_) | Self::RedisPool(_) => "cache_error",
            Self::HttpClient(_) => "upstream_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            Self::Validation { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                message.clone(),
                details.clone(),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None),
            Self::Database(e) => {
                tracing::error!("Database error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            Self::Redis(e) => {
                tracing::error!("Redis error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Cache error occurred".to_string(),
                    None,
                )
            }
            Self::RedisPool(e) => {
                tracing::error!("Redis pool error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Cache connection error occurred".to_string(),
                    None,
                )
            }
            Self::Jwt(e) => {
                tracing::warn!("JWT error: {e:?}");
                (StatusCode::UNAUTHORIZED, format!("JWT error: {e}"), None)
            }
            Self::Json(e) => {
                tracing::error!("JSON error: {e:?}");
                (StatusCode::BAD_REQUEST, format!("JSON error: {e}"), None)
            }
            Self::HttpClient(e) => {
                tracing::warn!("HTTP client error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "External service error".to_string(),
                    None,
                )
            }
        };

        // Report error to Sentry for server errors
        if status.is_server_error() {
            sentry::capture_error(&self);
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": error_message,
                "status": status.as_u16(),
                "details": details,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting validation errors.
pub trait ValidationErrorExt {
    fn to_validation_error(&self) -> AppError;
}

impl ValidationErrorExt for validator::ValidationErrors {
    fn to_validation_error(&self) -> AppError {
        // Collect every field error into the details object
        let mut fields = serde_json::Map::new();
        for (field, errors) in self.field_errors() {
            let messages: Vec<Value> = errors
                .iter()
                .map(|e| {
                    e.message.as_ref().map_or_else(
                        || json!(format!("failed validation rule '{}'", e.code)),
                        |m| json!(m.to_string()),
                    )
                })
                .collect();
            fields.insert(field.to_string(), Value::Array(messages));
        }

        let message = fields
            .iter()
            .next()
            .and_then(|(field, msgs)| {
                msgs.as_array()
                    .and_then(|a| a.first())
                    .and_then(Value::as_str)
                    .map(|m| format!("{field}: {m}"))
            })
            .unwrap_or_else(|| "Validation failed".to_string());

        AppError::Validation {
            message,
            details: Some(Value::Object(fields)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_app_error_bad_request_display() {
        let error = AppError::BadRequest("malformed filter".to_string());
        assert_eq!(error.to_string(), "Bad request: malformed filter");
    }

    #[test]
    fn test_app_error_unauthorized_display() {
        let error = AppError::Unauthorized("no token".to_string());
        assert_eq!(error.to_string(), "Unauthorized: no token");
    }

    #[test]
    fn test_app_error_forbidden_display() {
        let error = AppError::Forbidden("read-only token".to_string());
        assert_eq!(error.to_string(), "Forbidden: read-only token");
    }

    #[test]
    fn test_app_error_not_found_display() {
        let error = AppError::NotFound("Order not found".to_string());
        assert_eq!(error.to_string(), "Not found: Order not found");
    }

    #[test]
    fn test_app_error_validation_display() {
        let error = AppError::validation("status is not valid");
        assert_eq!(error.to_string(), "Validation error: status is not valid");
    }

    #[test]
    fn test_app_error_internal_display() {
        let error = AppError::Internal("event bus down".to_string());
        assert_eq!(error.to_string(), "Internal server error: event bus down");
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AppError::BadRequest(String::new()).code(), "bad_request");
        assert_eq!(AppError::Unauthorized(String::new()).code(), "unauthorized");
        assert_eq!(AppError::Forbidden(String::new()).code(), "forbidden");
        assert_eq!(AppError::NotFound(String::new()).code(), "not_found");
        assert_eq!(AppError::validation("x").code(), "validation_failed");
        assert_eq!(AppError::Internal(String::new()).code(), "internal_error");
    }

    #[tokio::test]
    async fn test_bad_request_into_response() {
        let error = AppError::BadRequest("bad filter".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unauthorized_into_response() {
        let error = AppError::Unauthorized("token required".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forbidden_into_response() {
        let error = AppError::Forbidden("nope".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_not_found_into_response() {
        let error = AppError::NotFound("missing".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_into_response_is_422() {
        let error = AppError::validation("invalid status");
        let response = error.into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_internal_into_response() {
        let error = AppError::Internal("boom".to_string());
        let response = error.into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        use axum::body::to_bytes;

        let error = AppError::NotFound("Order not found".to_string());
        let response = error.into_response();

        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();

        let envelope = parsed.get("error").expect("error key");
        assert_eq!(envelope["code"], "not_found");
        assert_eq!(envelope["message"], "Order not found");
        assert_eq!(envelope["status"], 404);
        assert!(envelope["details"].is_null());
    }

    #[tokio::test]
    async fn test_validation_envelope_carries_details() {
        use axum::body::to_bytes;

        let error = AppError::Validation {
            message: "latitude: out of range".to_string(),
            details: Some(json!({"latitude": ["out of range"]})),
        };
        let response = error.into_response();

        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();

        let envelope = &parsed["error"];
        assert_eq!(envelope["status"], 422);
        assert_eq!(envelope["details"]["latitude"][0], "out of range");
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));
    }

    #[test]
    fn test_app_result_ok() {
        let result: AppResult<i32> = Ok(42);
        assert!(result.is_ok());
        assert_eq!(result.ok(), Some(42));
    }

    #[test]
    fn test_app_result_err() {
        let result: AppResult<i32> = Err(AppError::NotFound("missing".to_string()));
        assert!(result.is_err());
    }

    // ============ ValidationErrorExt ============

    #[test]
    fn test_validation_error_ext_empty_errors() {
        use validator::ValidationErrors;

        let errors = ValidationErrors::new();
        let app_error = errors.to_validation_error();

        assert!(matches!(app_error, AppError::Validation { .. }));
    }

    #[test]
    fn test_validation_error_ext_collects_field_details() {
        use std::borrow::Cow;
        use validator::{ValidationError, ValidationErrors};

        let mut errors = ValidationErrors::new();
        let mut field_error = ValidationError::new("range");
        field_error.message = Some(Cow::Borrowed("latitude must be between -90 and 90"));
        errors.add("latitude", field_error);

        let app_error = errors.to_validation_error();
        match app_error {
            AppError::Validation { message, details } => {
                assert!(message.contains("latitude"));
                let details = details.expect("details present");
                assert_eq!(
                    details["latitude"][0],
                    "latitude must be between -90 and 90"
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_all_error_types_produce_valid_response() {
        let errors: Vec<AppError> = vec![
            AppError::BadRequest("bad".to_string()),
            AppError::Unauthorized("unauth".to_string()),
            AppError::Forbidden("forbidden".to_string()),
            AppError::NotFound("not found".to_string()),
            AppError::validation("invalid"),
            AppError::Internal("internal".to_string()),
        ];

        for error in errors {
            let response = error.into_response();
            assert!(response.status().is_client_error() || response.status().is_server_error());
        }
    }
}
