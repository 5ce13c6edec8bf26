// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error};

/// API error types
///
/// User-facing bodies are Polish; technical detail stays in the logs.
#[derive(Debug)]
pub enum ApiError {
    /// 401 with the fixed body `{"error":"Nieautoryzowany dostęp"}`.
    /// The inner string is a log-only hint and never reaches the client.
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Gone(String),
    /// 500 whose inner string is user-safe Polish prose.
    InternalServer(String),
    /// 500 naming the failed step, with the underlying detail exposed
    /// in the optional `message` field.
    DependencyFailure { context: String, detail: String },
    DatabaseError(sqlx::Error),
    ValidationError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Gone(msg) => write!(f, "Gone: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DependencyFailure { context, detail } => {
                write!(f, "Dependency Failure: {}: {}", context, detail)
            }
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

/// JSON error response structure: `{error, message?}`
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, detail) = match self {
            ApiError::Unauthorized(hint) => {
                if !hint.is_empty() {
                    debug!(hint = %hint, "Rejecting request as unauthorized");
                }
                (
                    StatusCode::UNAUTHORIZED,
                    "Nieautoryzowany dostęp".to_string(),
                    None,
                )
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Gone(msg) => (StatusCode::GONE, msg, None),
            ApiError::InternalServer(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            ApiError::DependencyFailure { context, detail } => {
                error!(context = %context, detail = %detail, "Dependency call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, context, Some(detail))
            }
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Wystąpił błąd serwera".to_string(),
                    None,
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, None),
        };

        let error_response = ErrorResponse {
            error: error_message,
            message: detail,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e)
    }
}
