//! Process-wide room registry: creation, lookup, membership changes,
//! termination, and the background sweeper.
//!
//! The registry map is the only cross-room shared state; it is held only
//! for the span of an insert/lookup/remove. Everything else is room-local
//! behind each room's own lock.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::room::{GameSettings, Room};
use crate::agents::roster;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::GameError;
use crate::game::{GameSnapshot, GameState, SlotPool};
use crate::llm::LlmProvider;
use crate::orchestrator;
use crate::protocol::{room_codes, Player, PlayerId, RoomStatus, ServerEvent};

/// Hard limits on room sizes.
const MAX_HUMANS_LIMIT: u8 = 4;
const MAX_TOTAL_PLAYERS: u8 = 12;

/// Outcome of a leave call, mirrored into the API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveAction {
    Terminated,
    Removed,
}

/// Outcome of a join call.
#[derive(Debug, Clone)]
pub struct JoinResult {
    pub player_id: PlayerId,
    pub can_start: bool,
    pub current_humans: Vec<PlayerId>,
    pub max_humans: u8,
}

/// One row of the waiting-room listing.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub room_code: String,
    pub room_name: String,
    pub current_humans: usize,
    pub max_humans: u8,
    pub total_players: u8,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

/// Metadata for the info endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub room_code: String,
    pub room_name: String,
    pub status: RoomStatus,
    pub max_humans: u8,
    pub total_players: u8,
    pub current_humans: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
}

pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
    settings: GameSettings,
    event_buffer: usize,
    default_num_ai: u8,
    rooms_per_page: u32,
    sweep_interval: std::time::Duration,
    clock: Arc<dyn Clock>,
    provider: Arc<dyn LlmProvider>,
    shutdown: CancellationToken,
}

impl RoomRegistry {
    pub fn new(config: &Config, provider: Arc<dyn LlmProvider>, clock: Arc<dyn Clock>) -> Arc<Self> {
        let settings = GameSettings::from_config(&config.game, &config.server);
        Self::with_settings(config, settings, provider, clock)
    }

    /// Construct with explicit pacing, bypassing the config's whole-second
    /// granularity. Used by tests that need compressed game windows.
    pub fn with_settings(
        config: &Config,
        settings: GameSettings,
        provider: Arc<dyn LlmProvider>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            rooms: DashMap::new(),
            settings,
            event_buffer: config.server.event_buffer_size,
            default_num_ai: config.game.num_ai_players,
            rooms_per_page: config.server.rooms_per_page.max(1),
            sweep_interval: std::time::Duration::from_secs(config.server.sweep_interval_secs.max(1)),
            clock,
            provider,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn get(&self, code: &str) -> Result<Arc<Room>, GameError> {
        self.rooms
            .get(code)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(GameError::NotFound)
    }

    /// Create a room. Agents are seated immediately on their drawn
    /// numbers; the rest of the draw becomes the human slot pool.
    pub fn create(
        &self,
        name: Option<String>,
        max_humans: u8,
        total_players: Option<u8>,
    ) -> Result<Arc<Room>, GameError> {
        if !(1..=MAX_HUMANS_LIMIT).contains(&max_humans) {
            return Err(GameError::InvalidArgument(format!(
                "max_humans must be between 1 and {MAX_HUMANS_LIMIT} (got {max_humans})"
            )));
        }
        let total = total_players.unwrap_or_else(|| max_humans.saturating_add(self.default_num_ai));
        if total < max_humans || total > MAX_TOTAL_PLAYERS {
            return Err(GameError::InvalidArgument(format!(
                "total_players must be between max_humans ({max_humans}) and {MAX_TOTAL_PLAYERS} (got {total})"
            )));
        }

        let num_ai = (total - max_humans) as usize;
        let drawn = roster::draw_numbers(total);
        let offset = roster::personality_offset();
        let agents: Vec<Player> = drawn
            .iter()
            .take(num_ai)
            .enumerate()
            .map(|(i, n)| Player::agent(PlayerId::new(*n), roster::personality(offset, i)))
            .collect();
        let pool = SlotPool::new(drawn.into_iter().skip(num_ai));

        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Masquerade Room".to_string());
        let state = GameState::new(agents, pool);

        // Draw codes until one is unused; insertion through the vacant
        // entry keeps the draw race-free.
        loop {
            let code = room_codes::generate_room_code();
            match self.rooms.entry(code.clone()) {
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    let room = Arc::new(Room::new(
                        code.clone(),
                        name,
                        max_humans,
                        total,
                        self.settings.clone(),
                        state,
                        self.event_buffer,
                        Arc::clone(&self.clock),
                        Arc::clone(&self.provider),
                    ));
                    slot.insert(Arc::clone(&room));
                    tracing::info!(
                        room_code = %code,
                        max_humans,
                        total_players = total,
                        num_ai,
                        "Room created"
                    );
                    return Ok(room);
                }
            }
        }
    }

    /// Rooms still waiting for players, newest first, paginated.
    pub async fn list_waiting(
        &self,
        page: u32,
        per_page: Option<u32>,
    ) -> (Vec<RoomSummary>, u32) {
        let per_page = per_page.unwrap_or(self.rooms_per_page).max(1);
        let mut waiting = Vec::new();
        let rooms: Vec<Arc<Room>> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for room in rooms {
            let st = room.lock().await;
            if st.status == RoomStatus::Waiting {
                waiting.push(RoomSummary {
                    room_code: room.code.clone(),
                    room_name: room.name.clone(),
                    current_humans: st.human_count(),
                    max_humans: room.max_humans,
                    total_players: room.total_players,
                    status: st.status,
                    created_at: room.created_at,
                });
            }
        }
        waiting.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = waiting.len() as u32;
        let total_pages = total.div_ceil(per_page).max(1);
        let start = page.saturating_sub(1).saturating_mul(per_page) as usize;
        let page_rows: Vec<RoomSummary> = waiting
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        (page_rows, total_pages)
    }

    pub async fn info(&self, code: &str) -> Option<RoomInfo> {
        let room = self.get(code).ok()?;
        let st = room.lock().await;
        Some(RoomInfo {
            room_code: room.code.clone(),
            room_name: room.name.clone(),
            status: st.status,
            max_humans: room.max_humans,
            total_players: room.total_players,
            current_humans: st.human_ids(),
            created_at: room.created_at,
        })
    }

    /// Seat a human in a waiting room. The first joiner becomes the
    /// creator; when the last human seat fills, the game starts and the
    /// per-room orchestrator is spawned.
    pub async fn join(&self, code: &str) -> Result<JoinResult, GameError> {
        let room = self.get(code)?;
        let (result, start_game) = {
            let mut st = room.lock().await;
            match st.status {
                RoomStatus::Waiting => {}
                RoomStatus::InProgress | RoomStatus::Completed => {
                    return Err(GameError::RoomInProgress)
                }
            }
            let player_id = st.seat_human()?;
            let humans = st.human_ids();
            let can_start = humans.len() == room.max_humans as usize;
            if can_start {
                st.status = RoomStatus::InProgress;
            }
            (
                JoinResult {
                    player_id,
                    can_start,
                    current_humans: humans,
                    max_humans: room.max_humans,
                },
                can_start,
            )
        };

        room.hub.broadcast(ServerEvent::PlayerList {
            players: room.lock().await.public_players(),
        });

        tracing::info!(
            room_code = %room.code,
            player_id = %result.player_id,
            can_start = result.can_start,
            "Player joined room"
        );

        if start_game {
            orchestrator::spawn(Arc::clone(&room));
        }
        Ok(result)
    }

    /// Remove a human. The creator leaving during `waiting` terminates
    /// the room; a room left with no humans is destroyed. Leaving twice
    /// is safe and has no effect after the first.
    pub async fn leave(&self, code: &str, player_id: PlayerId) -> Result<LeaveAction, GameError> {
        let room = self.get(code)?;

        enum Outcome {
            Terminate(&'static str),
            Removed { now_empty: bool },
            Noop,
        }

        let outcome = {
            let mut st = room.lock().await;
            if st.status == RoomStatus::Waiting && st.creator == Some(player_id) {
                Outcome::Terminate("creator left the room")
            } else if st.unseat_human(player_id) {
                Outcome::Removed {
                    now_empty: st.human_count() == 0,
                }
            } else {
                Outcome::Noop
            }
        };

        match outcome {
            Outcome::Terminate(reason) => {
                self.terminate(code, reason).await;
                Ok(LeaveAction::Terminated)
            }
            Outcome::Removed { now_empty } => {
                tracing::info!(room_code = %room.code, %player_id, "Player left room");
                if now_empty {
                    self.terminate(code, "room is empty").await;
                } else {
                    room.hub.broadcast(ServerEvent::PlayerList {
                        players: room.lock().await.public_players(),
                    });
                }
                Ok(LeaveAction::Removed)
            }
            Outcome::Noop => Ok(LeaveAction::Removed),
        }
    }

    /// Commit a human chat message and wake the agents.
    pub async fn post_message(
        &self,
        code: &str,
        player_id: PlayerId,
        text: String,
    ) -> Result<(), GameError> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(GameError::InvalidArgument("message text is empty".into()));
        }
        let room = self.get(code)?;
        let message = {
            let mut st = room.lock().await;
            st.validate_human_message(player_id)?;
            let now = room.clock.now();
            st.commit_message(player_id, text, now)
        };
        room.hub.broadcast(ServerEvent::Message {
            sender: message.sender,
            text: message.text,
            timestamp: message.timestamp,
        });

        // A fresh human message is one of the two decision-pass triggers.
        orchestrator::trigger_decision_pass(Arc::clone(&room), None);
        Ok(())
    }

    /// Commit a human vote.
    pub async fn cast_vote(
        &self,
        code: &str,
        voter: PlayerId,
        target: PlayerId,
    ) -> Result<(), GameError> {
        let room = self.get(code)?;
        {
            let mut st = room.lock().await;
            st.record_vote(voter, target)?;
        }
        room.hub.broadcast(ServerEvent::Voted { voter });
        room.votes_changed.notify_waiters();
        Ok(())
    }

    pub async fn snapshot(&self, code: &str) -> Result<GameSnapshot, GameError> {
        let room = self.get(code)?;
        let st = room.lock().await;
        Ok(st.snapshot(&room.code, &room.name))
    }

    /// Destroy a room: unregister it, cancel all of its tasks, and close
    /// every connection with a terminal event.
    pub async fn terminate(&self, code: &str, reason: &str) -> bool {
        let Some((_, room)) = self.rooms.remove(code) else {
            return false;
        };
        room.cancel();
        room.hub.close_all(ServerEvent::RoomTerminated {
            reason: reason.to_string(),
        });
        tracing::info!(room_code = %code, reason, "Room terminated");
        true
    }

    /// Background sweeper: reaps completed rooms after their linger
    /// window and waiting rooms that nobody ever joined.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = registry.shutdown.cancelled() => return,
                    () = registry.clock.sleep(registry.sweep_interval) => {}
                }
                registry.sweep().await;
            }
        });
    }

    async fn sweep(&self) {
        let now = self.clock.now();
        let wall_now = Utc::now();
        let rooms: Vec<Arc<Room>> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for room in rooms {
            let reason = {
                let st = room.lock().await;
                match st.status {
                    RoomStatus::Completed => st.completed_at.and_then(|at| {
                        (now.saturating_duration_since(at) >= self.settings.completed_room_linger)
                            .then_some("game finished")
                    }),
                    RoomStatus::Waiting if st.human_count() == 0 => {
                        let age = wall_now.signed_duration_since(room.created_at);
                        (age.num_seconds() >= self.settings.abandoned_room_grace.as_secs() as i64)
                            .then_some("room was never joined")
                    }
                    RoomStatus::InProgress if st.human_count() == 0 => Some("all humans left"),
                    _ => None,
                }
            };
            if let Some(reason) = reason {
                self.terminate(&room.code, reason).await;
            }
        }
    }

    /// Cancel every room and the sweeper. Used on server shutdown.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let codes: Vec<String> = self.rooms.iter().map(|e| e.key().clone()).collect();
        for code in codes {
            self.terminate(&code, "server shutting down").await;
        }
    }
}
