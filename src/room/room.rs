//! The room object: settings, game state behind its mutex, the broadcast
//! hub, and the cancellation token that tears everything down.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, Notify};
use tokio_util::sync::CancellationToken;

use super::hub::RoomHub;
use crate::clock::Clock;
use crate::config::{GameConfig, ServerConfig};
use crate::game::GameState;
use crate::llm::LlmProvider;

/// Pacing and rule parameters, resolved once from config at registry
/// construction and shared by every room.
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub discussion_time: Duration,
    pub voting_time: Duration,
    pub typing_delay: Duration,
    pub message_cooldown: Duration,
    pub rounds_to_win: u32,
    pub max_concurrent_agent_responses: usize,
    /// Interval of the proactive idle check; also the quiet period that
    /// triggers it.
    pub idle_check_interval: Duration,
    pub completed_room_linger: Duration,
    pub abandoned_room_grace: Duration,
}

impl GameSettings {
    pub fn from_config(game: &GameConfig, server: &ServerConfig) -> Self {
        Self {
            discussion_time: Duration::from_secs(game.discussion_secs),
            voting_time: Duration::from_secs(game.voting_secs),
            typing_delay: Duration::from_millis(game.typing_delay_ms),
            message_cooldown: Duration::from_secs(game.message_cooldown_secs),
            rounds_to_win: game.rounds_to_win,
            max_concurrent_agent_responses: game.max_concurrent_agent_responses.max(1),
            idle_check_interval: Duration::from_secs(game.idle_check_secs.max(1)),
            completed_room_linger: Duration::from_secs(server.completed_room_linger_secs),
            abandoned_room_grace: Duration::from_secs(server.empty_room_grace_secs),
        }
    }
}

pub struct Room {
    pub code: String,
    pub name: String,
    pub max_humans: u8,
    pub total_players: u8,
    pub created_at: DateTime<Utc>,
    pub settings: GameSettings,
    pub hub: RoomHub,
    /// Pinged whenever a vote commits so the voting window can end early.
    pub votes_changed: Notify,
    pub clock: Arc<dyn Clock>,
    pub provider: Arc<dyn LlmProvider>,
    state: Mutex<GameState>,
    cancel: CancellationToken,
}

impl Room {
    pub fn new(
        code: String,
        name: String,
        max_humans: u8,
        total_players: u8,
        settings: GameSettings,
        state: GameState,
        event_buffer: usize,
        clock: Arc<dyn Clock>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            code,
            name,
            max_humans,
            total_players,
            created_at: Utc::now(),
            settings,
            hub: RoomHub::new(event_buffer),
            votes_changed: Notify::new(),
            clock,
            provider,
            state: Mutex::new(state),
            cancel: CancellationToken::new(),
        }
    }

    /// Acquire the room lock. Every state read and write goes through
    /// this guard; hold it only for the span of the mutation, never
    /// across a model call or a sleep.
    pub async fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().await
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Tear the room down: every in-flight task observes this between
    /// suspensions and returns without committing state.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
