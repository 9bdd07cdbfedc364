//! Game error kinds surfaced through the public API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::protocol::ErrorCode;

/// Errors produced by room and game operations. Each kind maps to a
/// machine-readable [`ErrorCode`] and an HTTP status.
///
/// Terminated rooms are removed from the registry in the same call that
/// destroys them, so requests against them surface as `NotFound`; the
/// `room_terminated` socket event is the terminated-specific signal.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("room not found")]
    NotFound,

    #[error("room is full")]
    RoomFull,

    #[error("game already in progress")]
    RoomInProgress,

    #[error("{0}")]
    PhaseViolation(String),
}

impl GameError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::NotFound => ErrorCode::NotFound,
            Self::RoomFull => ErrorCode::RoomFull,
            Self::RoomInProgress => ErrorCode::RoomInProgress,
            Self::PhaseViolation(_) => ErrorCode::PhaseViolation,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) | Self::PhaseViolation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RoomFull | Self::RoomInProgress => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (self.status(), Json(body)).into_response()
    }
}
