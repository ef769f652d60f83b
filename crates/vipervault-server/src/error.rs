//! HTTP error types for the `ViperVault` server.
//!
//! Maps domain errors from `vipervault-core` into HTTP responses with a
//! JSON body carrying a machine-readable `error` field and a
//! human-readable `message`. The viewer-facing rejections (no session,
//! unknown view) are plain text built where they occur, because their
//! consumer drops the body straight into the page — only genuine
//! server-side failures flow through here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use vipervault_core::error::{CommandError, SessionError};

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Internal server error.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let Self::Internal(message) = self;

        let body = ErrorBody {
            error: "internal_error",
            message,
        };

        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Directory { .. } | SessionError::Write { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Spawn { .. } | CommandError::Wait { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}
