//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rentdesk_auth::AuthError;
use rentdesk_core::CoreError;
use rentdesk_db::DbError;
use rentdesk_storage::StorageError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// A single rejected input field
#[derive(Debug, Clone, Serialize, PartialEq)]
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

impl From<CoreError> for FieldError {
    fn from(err: CoreError) -> Self {
        FieldError::new(err.field(), err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Shorthand for a validation failure on one field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }

    fn internal(&self) -> Response {
        error!("Request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "message": "Internal server error" })),
        )
            .into_response()
    }
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "message": message.into() }))).into_response()
}

fn unauthorized(details: impl Into<String>) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({ "message": "Unauthorized", "details": details.into() })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "errors": errors })),
            )
                .into_response(),
            ApiError::Unauthorized(details) => unauthorized(details.clone()),
            ApiError::InvalidCredentials => message(StatusCode::UNAUTHORIZED, "Invalid credentials"),
            ApiError::Forbidden(msg) => message(StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => message(StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) | ApiError::BadRequest(msg) => {
                message(StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::Database(DbError::Duplicate(msg)) => {
                message(StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::Database(DbError::NotFound(msg)) => {
                message(StatusCode::NOT_FOUND, msg.clone())
            }
            ApiError::Auth(AuthError::InvalidCredentials) => {
                message(StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
            ApiError::Auth(e) if e.is_client_error() => unauthorized(e.to_string()),
            ApiError::Internal(_)
            | ApiError::Database(_)
            | ApiError::Auth(_)
            | ApiError::Storage(_) => self.internal(),
        }
    }
}
