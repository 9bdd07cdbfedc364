//! Typed events flowing over the per-room event stream.
//!
//! Server events are the authoritative record of what happened in a room;
//! within a single connection they are delivered in the exact order the
//! orchestrator enqueued them. Client frames are advisory only; state
//! mutation always goes through the REST surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error_codes::ErrorCode;
use super::types::{Phase, PlayerId, PlayerPublic, Role, Winner};

/// Typing indicator edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypingState {
    Start,
    Stop,
}

/// One target's share of the vote count in a `voting_result` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteCount {
    pub target: PlayerId,
    pub votes: usize,
}

/// Events sent from server to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Authoritative membership snapshot, emitted on every membership
    /// change and to each freshly attached connection.
    PlayerList { players: Vec<PlayerPublic> },
    /// The topic for the current round.
    Topic { topic: String, round: u32 },
    /// Phase transition.
    Phase { phase: Phase },
    /// A committed chat message.
    Message {
        sender: PlayerId,
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// Typing indicator. Agent indicators are authoritative; relayed human
    /// indicators are advisory.
    Typing { player: PlayerId, state: TypingState },
    /// A vote was committed. Never reveals the target.
    Voted { voter: PlayerId },
    /// Tally at the end of a voting window.
    VotingResult {
        counts: Vec<VoteCount>,
        suspect: Option<PlayerId>,
        suspect_role: Option<Role>,
    },
    /// A player was eliminated.
    Elimination { player: PlayerId },
    /// The game ended.
    GameOver {
        winner: Winner,
        suspect: Option<PlayerId>,
        suspect_role: Option<Role>,
    },
    /// A new round is starting.
    NewRound { round: u32 },
    /// Terminal event: the room is gone. The connection closes after this.
    RoomTerminated { reason: String },
    /// An error surfaced to one connection.
    Error { message: String, code: ErrorCode },
    /// Heartbeat reply.
    Pong,
}

/// Frames accepted from clients over the duplex channel. Heartbeats and
/// typing hints only. `message` and `vote` mutations are REST-only and
/// any such frame is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    Ping,
    Typing { state: TypingState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_snake_case_tags() {
        let ev = ServerEvent::Phase {
            phase: Phase::Discussion,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "phase");
        assert_eq!(json["data"]["phase"], "discussion");

        let ev = ServerEvent::Typing {
            player: PlayerId::new(3),
            state: TypingState::Start,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "typing");
        assert_eq!(json["data"]["player"], "Player 3");
        assert_eq!(json["data"]["state"], "start");
    }

    #[test]
    fn voted_event_hides_target() {
        let ev = ServerEvent::Voted {
            voter: PlayerId::new(2),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["data"]["voter"], "Player 2");
        assert!(json["data"].get("target").is_none());
    }

    #[test]
    fn client_frames_parse() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(frame, ClientFrame::Ping);

        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"typing","data":{"state":"stop"}}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Typing {
                state: TypingState::Stop
            }
        );
    }

    #[test]
    fn unknown_client_frames_are_rejected() {
        // A client trying to push a chat message over the socket must fail
        // to parse; the REST path is the only authoritative mutation path.
        let result = serde_json::from_str::<ClientFrame>(
            r#"{"type":"message","data":{"text":"hi"}}"#,
        );
        assert!(result.is_err());
    }
}
