use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable error codes carried alongside every error payload,
/// both in REST responses and in `error` events on the event stream.
///
/// Every variant is producible by a live request path. Rooms that have
/// been destroyed are indistinguishable from rooms that never existed
/// (the registry drops the entry synchronously), so both surface as
/// `NotFound`; socket consumers additionally see the `room_terminated`
/// event before their connection closes. Model failures never reach
/// clients at all; they are absorbed by the gameplay fallbacks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request validation
    InvalidArgument,

    // Room lookup / lifecycle
    NotFound,
    RoomFull,
    RoomInProgress,

    // Game rules
    PhaseViolation,
}

impl ErrorCode {
    /// Human-readable description, suitable for client display.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidArgument => {
                "The request is invalid or malformed. Check the room size parameters and body fields."
            }
            Self::NotFound => "No room exists with that code.",
            Self::RoomFull => "All human seats in this room are taken.",
            Self::RoomInProgress => "The game has already started; new players cannot join.",
            Self::PhaseViolation => {
                "The action is not allowed in the current phase of the game."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::RoomFull => "ROOM_FULL",
            Self::RoomInProgress => "ROOM_IN_PROGRESS",
            Self::PhaseViolation => "PHASE_VIOLATION",
        };
        f.write_str(s)
    }
}
