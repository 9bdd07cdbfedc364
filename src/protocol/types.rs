//! Core identifier and state types for the game protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A numbered player slot, rendered as `Player N` everywhere a client can
/// see it. Humans and agents draw their numbers from one shuffled pool, so
/// a human's number is indistinguishable from an agent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u8);

impl PlayerId {
    pub fn new(number: u8) -> Self {
        Self(number)
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Error returned when a string does not look like `Player N`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid player id: {0:?}")]
pub struct ParsePlayerIdError(pub String);

impl FromStr for PlayerId {
    type Err = ParsePlayerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .trim()
            .strip_prefix("Player ")
            .ok_or_else(|| ParsePlayerIdError(s.to_string()))?;
        rest.parse::<u8>()
            .map(PlayerId)
            .map_err(|_| ParsePlayerIdError(s.to_string()))
    }
}

impl Serialize for PlayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether a seat is controlled by a person or by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

/// Stage of the round state machine. Transitions are monotone within a
/// round: discussion, voting, elimination, then either the next round's
/// discussion or game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    Discussion,
    Voting,
    Elimination,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lobby => "lobby",
            Self::Discussion => "discussion",
            Self::Voting => "voting",
            Self::Elimination => "elimination",
            Self::GameOver => "game_over",
        };
        f.write_str(s)
    }
}

/// Room lifecycle status as shown in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Completed,
}

/// Which side won the game, if it has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Human,
    Ai,
}

/// A seat at the table. The `personality` is set for agents only and is
/// never serialized toward clients.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub role: Role,
    pub eliminated: bool,
    pub voted: bool,
    pub personality: Option<String>,
}

impl Player {
    pub fn agent(id: PlayerId, personality: String) -> Self {
        Self {
            id,
            role: Role::Ai,
            eliminated: false,
            voted: false,
            personality: Some(personality),
        }
    }

    pub fn human(id: PlayerId) -> Self {
        Self {
            id,
            role: Role::Human,
            eliminated: false,
            voted: false,
            personality: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.eliminated
    }
}

/// Client-visible projection of a [`Player`]. Deliberately omits the role:
/// the whole game is telling humans and agents apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerPublic {
    pub id: PlayerId,
    pub eliminated: bool,
    pub has_voted: bool,
}

impl From<&Player> for PlayerPublic {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            eliminated: p.eliminated,
            has_voted: p.voted,
        }
    }
}

/// One committed chat line. Appended only while the phase is `discussion`,
/// and only through the commit path that re-validates the phase under the
/// room lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: PlayerId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}
