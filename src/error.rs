// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::models::session::SessionError;

/// Domain errors raised while driving the model and the scoring endpoint.
#[derive(Error, Debug)]
pub enum ExamError {
    /// Transport, auth or rate-limit failure calling the language model.
    #[error("Generation failed: {message}")]
    Generation { message: String, retryable: bool },

    /// The model answered, but not with the JSON we asked for.
    #[error("Unparseable {what} response")]
    Parse { what: &'static str },

    /// Bad inbound parameters. Raised before any external call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The final score post failed.
    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExamError {
    /// A generation failure that will not go away on retry (auth, bad request).
    pub fn generation(msg: impl fmt::Display) -> Self {
        ExamError::Generation {
            message: msg.to_string(),
            retryable: false,
        }
    }

    /// A generation failure worth retrying (transport, timeout, 429, 5xx).
    pub fn transient(msg: impl fmt::Display) -> Self {
        ExamError::Generation {
            message: msg.to_string(),
            retryable: true,
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExamError::Generation { retryable: true, .. })
    }
}

impl From<reqwest::Error> for ExamError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS => {
                ExamError::generation(err)
            }
            _ => ExamError::transient(err),
        }
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., submitting before questions exist)
    Conflict(String),

    // 502 Bad Gateway (the model failed us)
    Upstream(String),
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
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts domain errors into user-facing HTTP errors.
/// Generation and parse failures stay distinguishable in the message.
impl From<ExamError> for AppError {
    fn from(err: ExamError) -> Self {
        match err {
            ExamError::Generation { message, .. } => {
                AppError::Upstream(format!("Question generation failed: {}", message))
            }
            ExamError::Parse { what } => AppError::Upstream(format!(
                "Model returned malformed output: no valid {} questions. Please try again.",
                what
            )),
            ExamError::Validation(msg) => AppError::BadRequest(msg),
            ExamError::Submission(msg) | ExamError::Config(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

/// Phase violations and an incomplete MCQ sheet are conflicts; bad keys are bad requests.
impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::WrongPhase { .. } | SessionError::Incomplete { .. } => {
                AppError::Conflict(err.to_string())
            }
            SessionError::UnknownQuestion { .. } | SessionError::InvalidOption { .. } => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

/// Body extraction failures keep the JSON error shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
