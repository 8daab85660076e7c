// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::data::LoadError;
use crate::reminders::ReminderError;
use crate::runner::SessionError;
use crate::selector::SelectError;
use crate::store::StorageError;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., answering a locked question)
    Conflict(String),

    // 503 / 422 depending on whether the data file could be read at all
    DataUnavailable(LoadError),

    // 400 with redirect instructions for the quiz page
    InvalidLink {
        message: String,
        redirect_to: String,
        delay_ms: u64,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::DataUnavailable(err) => {
                let status = match err {
                    LoadError::Fetch { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    LoadError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (
                    status,
                    json!({
                        "error": "問題の読み込みに失敗しました",
                        "detail": err,
                        "message": err.to_string(),
                        "retry": "/api/data/reload",
                    }),
                )
            }
            AppError::InvalidLink {
                message,
                redirect_to,
                delay_ms,
            } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": message,
                    "redirect_to": redirect_to,
                    "redirect_after_ms": delay_ms,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::DataUnavailable(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<SelectError> for AppError {
    fn from(err: SelectError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoQuestions => AppError::NotFound(err.to_string()),
            SessionError::AlreadyAnswered(_) => AppError::Conflict(err.to_string()),
            SessionError::InvalidChoice { .. } => AppError::BadRequest(err.to_string()),
            SessionError::Storage(e) => e.into(),
        }
    }
}

impl From<ReminderError> for AppError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::NoRecipients => AppError::BadRequest(err.to_string()),
            ReminderError::Storage(e) => e.into(),
        }
    }
}
