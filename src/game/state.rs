//! The authoritative in-memory record of one room's game.
//!
//! Every read and write goes through the room's mutex; broadcast delivery
//! works from immutable snapshots assembled under the lock and released
//! before sending. Chat history order is commit order under the lock,
//! the canonical serialization point for the room.

use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

use super::slots::SlotPool;
use crate::error::GameError;
use crate::protocol::{
    ChatMessage, Phase, Player, PlayerId, PlayerPublic, Role, RoomStatus, Winner,
};

#[derive(Debug)]
pub struct GameState {
    pub status: RoomStatus,
    pub phase: Phase,
    /// Round number, 1-based once the game starts.
    pub round: u32,
    pub topic: String,
    pub players: Vec<Player>,
    /// First human to join; their departure during `waiting` terminates
    /// the room.
    pub creator: Option<PlayerId>,
    pub history: Vec<ChatMessage>,
    /// Voter → target for the current voting window.
    pub votes: HashMap<PlayerId, PlayerId>,
    /// Agents still eligible to speak this turn, in launch order.
    pub pending_ai_messages: Vec<PlayerId>,
    /// Agents still to vote this window, in deterministic order.
    pub pending_ai_votes: Vec<PlayerId>,
    /// Agents with a generation task currently in flight. The single-
    /// flight gate: an agent enters before its task is spawned and leaves
    /// in the task's guaranteed cleanup path.
    pub processing: HashSet<PlayerId>,
    /// Free numbers for future human joiners.
    pub slots: SlotPool,
    pub round_started_at: Option<Instant>,
    pub last_message_at: Option<Instant>,
    /// Per-agent cooldown anchor.
    pub last_spoke: HashMap<PlayerId, Instant>,
    pub winner: Option<Winner>,
    pub selected_suspect: Option<PlayerId>,
    pub suspect_role: Option<Role>,
    /// Set when the game completes; drives the post-game linger.
    pub completed_at: Option<Instant>,
}

impl GameState {
    pub fn new(agents: Vec<Player>, pool: SlotPool) -> Self {
        Self {
            status: RoomStatus::Waiting,
            phase: Phase::Lobby,
            round: 0,
            topic: String::new(),
            players: agents,
            creator: None,
            history: Vec::new(),
            votes: HashMap::new(),
            pending_ai_messages: Vec::new(),
            pending_ai_votes: Vec::new(),
            processing: HashSet::new(),
            slots: pool,
            round_started_at: None,
            last_message_at: None,
            last_spoke: HashMap::new(),
            winner: None,
            selected_suspect: None,
            suspect_role: None,
            completed_at: None,
        }
    }

    // ---- membership ----

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn humans(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.role == Role::Human)
    }

    pub fn human_count(&self) -> usize {
        self.humans().count()
    }

    pub fn human_ids(&self) -> Vec<PlayerId> {
        self.humans().map(|p| p.id).collect()
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    pub fn active_agents(&self) -> impl Iterator<Item = &Player> {
        self.active_players().filter(|p| p.role == Role::Ai)
    }

    /// Seat a human on the next pooled number. The caller holds the room
    /// lock and has already checked the room status.
    pub fn seat_human(&mut self) -> Result<PlayerId, GameError> {
        let number = self.slots.acquire().ok_or(GameError::RoomFull)?;
        let id = PlayerId::new(number);
        self.players.push(Player::human(id));
        if self.creator.is_none() {
            self.creator = Some(id);
        }
        Ok(id)
    }

    /// Remove a human and return their number to the pool (pool return
    /// only matters while `waiting`; after that the seat is just gone).
    /// Idempotent: removing an absent player is a no-op.
    pub fn unseat_human(&mut self, id: PlayerId) -> bool {
        let Some(pos) = self
            .players
            .iter()
            .position(|p| p.id == id && p.role == Role::Human)
        else {
            return false;
        };
        self.players.remove(pos);
        if self.status == RoomStatus::Waiting {
            self.slots.release(id.number());
        }
        self.votes.remove(&id);
        true
    }

    pub fn public_players(&self) -> Vec<PlayerPublic> {
        self.players.iter().map(PlayerPublic::from).collect()
    }

    /// Visible names of active players, anchored exactly as they appear
    /// in chat.
    pub fn visible_names(&self) -> Vec<String> {
        self.active_players().map(|p| p.id.to_string()).collect()
    }

    // ---- chat ----

    pub fn last_sender(&self) -> Option<PlayerId> {
        self.history.last().map(|m| m.sender)
    }

    /// Validate a human chat message against the current phase and the
    /// sender's standing. Phase re-validation happens here, under the
    /// lock, so a commit can never straddle a phase boundary.
    pub fn validate_human_message(&self, sender: PlayerId) -> Result<(), GameError> {
        if self.phase != Phase::Discussion {
            return Err(GameError::PhaseViolation(format!(
                "messages are only accepted during discussion (phase is now {})",
                self.phase
            )));
        }
        let player = self.player(sender).ok_or(GameError::NotFound)?;
        if player.eliminated {
            return Err(GameError::PhaseViolation(
                "eliminated players cannot send messages".to_string(),
            ));
        }
        if self.last_sender() == Some(sender) {
            return Err(GameError::PhaseViolation(
                "you sent the most recent message; let someone else speak".to_string(),
            ));
        }
        Ok(())
    }

    /// Append a message to the history. Callers validate phase first;
    /// this is the single commit path for both humans and agents.
    pub fn commit_message(&mut self, sender: PlayerId, text: String, now: Instant) -> ChatMessage {
        let message = ChatMessage {
            sender,
            text,
            timestamp: Utc::now(),
        };
        self.history.push(message.clone());
        self.last_message_at = Some(now);
        if self.player(sender).map(|p| p.role) == Some(Role::Ai) {
            self.last_spoke.insert(sender, now);
        }
        message
    }

    // ---- agent eligibility ----

    /// Agents allowed into a decision pass right now: active, not already
    /// generating, not on cooldown, not the most recent speaker, and not
    /// explicitly excluded (the cascade gate excludes the agent that just
    /// spoke).
    pub fn eligible_agents(
        &self,
        now: Instant,
        cooldown: Duration,
        exclude: Option<PlayerId>,
    ) -> Vec<(PlayerId, String)> {
        let last_sender = self.last_sender();
        self.active_agents()
            .filter(|p| Some(p.id) != exclude)
            .filter(|p| Some(p.id) != last_sender)
            .filter(|p| !self.processing.contains(&p.id))
            .filter(|p| !self.pending_ai_messages.contains(&p.id))
            .filter(|p| match self.last_spoke.get(&p.id) {
                Some(at) => now.saturating_duration_since(*at) >= cooldown,
                None => true,
            })
            .map(|p| (p.id, p.personality.clone().unwrap_or_default()))
            .collect()
    }

    // ---- voting ----

    pub fn record_vote(&mut self, voter: PlayerId, target: PlayerId) -> Result<(), GameError> {
        if self.phase != Phase::Voting {
            return Err(GameError::PhaseViolation(format!(
                "votes are only accepted during voting (phase is now {})",
                self.phase
            )));
        }
        let voter_player = self.player(voter).ok_or(GameError::NotFound)?;
        if voter_player.eliminated {
            return Err(GameError::PhaseViolation(
                "eliminated players cannot vote".to_string(),
            ));
        }
        if self.votes.contains_key(&voter) {
            return Err(GameError::PhaseViolation("already voted".to_string()));
        }
        if voter == target {
            return Err(GameError::PhaseViolation(
                "you cannot vote for yourself".to_string(),
            ));
        }
        match self.player(target) {
            Some(t) if t.is_active() => {}
            _ => {
                return Err(GameError::PhaseViolation(
                    "vote target is not an active player".to_string(),
                ))
            }
        }
        self.votes.insert(voter, target);
        if let Some(p) = self.player_mut(voter) {
            p.voted = true;
        }
        Ok(())
    }

    pub fn all_active_voted(&self) -> bool {
        self.active_players().all(|p| self.votes.contains_key(&p.id))
    }

    // ---- phase transitions (invoked by the orchestrator, under lock) ----

    /// Enter discussion for a fresh round.
    pub fn begin_round(&mut self, topic: String, now: Instant) {
        self.phase = Phase::Discussion;
        self.round += 1;
        self.topic = topic;
        self.votes.clear();
        self.pending_ai_votes.clear();
        self.pending_ai_messages.clear();
        for p in &mut self.players {
            p.voted = false;
        }
        self.selected_suspect = None;
        self.suspect_role = None;
        self.round_started_at = Some(now);
        self.last_message_at = None;
    }

    /// Enter voting: clears the speak queue and lines up every active
    /// agent to vote, in seat order.
    pub fn begin_voting(&mut self) -> Vec<PlayerId> {
        self.phase = Phase::Voting;
        self.pending_ai_messages.clear();
        let agents: Vec<PlayerId> = self.active_agents().map(|p| p.id).collect();
        self.pending_ai_votes = agents.clone();
        agents
    }

    /// Mark the game finished.
    pub fn finish(&mut self, winner: Winner, now: Instant) {
        self.winner = Some(winner);
        self.phase = Phase::GameOver;
        self.status = RoomStatus::Completed;
        self.completed_at = Some(now);
    }

    // ---- snapshots ----

    pub fn snapshot(&self, code: &str, name: &str) -> GameSnapshot {
        GameSnapshot {
            room_code: code.to_string(),
            room_name: name.to_string(),
            status: self.status,
            phase: self.phase,
            round: self.round,
            topic: self.topic.clone(),
            players: self.public_players(),
            history: self.history.clone(),
            votes_cast: self.votes.len(),
            winner: self.winner,
            selected_suspect: self.selected_suspect,
            suspect_role: self.suspect_role,
        }
    }
}

/// Read-only view served by `GET /api/rooms/{code}/state` for polling
/// clients. Never exposes roles of living players or vote targets.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub room_code: String,
    pub room_name: String,
    pub status: RoomStatus,
    pub phase: Phase,
    pub round: u32,
    pub topic: String,
    pub players: Vec<PlayerPublic>,
    pub history: Vec<ChatMessage>,
    pub votes_cast: usize,
    pub winner: Option<Winner>,
    pub selected_suspect: Option<PlayerId>,
    pub suspect_role: Option<Role>,
}
