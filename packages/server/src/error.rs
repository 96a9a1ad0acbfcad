use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `SESSION_EXPIRED`, `API_KEY_MISSING`,
    /// `API_KEY_INVALID`, `FORBIDDEN`, `NOT_FOUND`, `CONFLICT`, `EMAIL_TAKEN`,
    /// `RESET_FAILED`, `STORAGE_WRITE_FAILED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-200 characters")]
    pub message: String,
    /// Offending request field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "title")]
    pub field: Option<&'static str>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation {
        field: Option<&'static str>,
        message: String,
    },
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    SessionExpired,
    ApiKeyMissing,
    ApiKeyInvalid,
    Forbidden,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    ResetFailed,
    StorageWrite(String),
    Internal(String),
}

impl AppError {
    /// Validation error not tied to a single field.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Validation error on `field`.
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, field) = match self {
            AppError::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, field)
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
                None,
            ),
            AppError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "SESSION_EXPIRED",
                "Session expired, please log in again".into(),
                None,
            ),
            AppError::ApiKeyMissing => (
                StatusCode::UNAUTHORIZED,
                "API_KEY_MISSING",
                "X-API-KEY header is required".into(),
                None,
            ),
            AppError::ApiKeyInvalid => (
                StatusCode::UNAUTHORIZED,
                "API_KEY_INVALID",
                "Invalid API key".into(),
                None,
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "You are not allowed to modify this resource".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "An account with this email already exists".into(),
                None,
            ),
            AppError::ResetFailed => (
                StatusCode::BAD_REQUEST,
                "RESET_FAILED",
                "Invalid or expired password reset request".into(),
                None,
            ),
            AppError::StorageWrite(detail) => {
                tracing::error!("Storage write failed: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "STORAGE_WRITE_FAILED",
                    "The file could not be stored".into(),
                    None,
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };

        (
            status,
            ErrorBody {
                code,
                message,
                field,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!("Unique constraint caught on write: {detail}");
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => AppError::invalid_field("fileKey", msg),
            StorageError::NotFound(key) => AppError::NotFound(format!("Object '{key}' not found")),
            StorageError::WriteFailed { .. } => AppError::StorageWrite(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
