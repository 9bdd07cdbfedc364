//! Game pacing configuration.

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_discussion_secs, default_idle_check_secs, default_max_concurrent_agent_responses,
    default_message_cooldown_secs, default_num_ai_players, default_rounds_to_win,
    default_typing_delay_ms, default_voting_secs,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GameConfig {
    /// Agents seated when a create request does not spell out
    /// `total_players` (total defaults to `max_humans + num_ai_players`).
    #[serde(default = "default_num_ai_players")]
    pub num_ai_players: u8,
    /// Length of each discussion window, in seconds.
    #[serde(default = "default_discussion_secs")]
    pub discussion_secs: u64,
    /// Length of each voting window, in seconds.
    #[serde(default = "default_voting_secs")]
    pub voting_secs: u64,
    /// Rounds the humans must survive to win.
    #[serde(default = "default_rounds_to_win")]
    pub rounds_to_win: u32,
    /// Per-agent cooldown between messages, in seconds.
    #[serde(default = "default_message_cooldown_secs")]
    pub message_cooldown_secs: u64,
    /// Pause between an agent's typing indicator and its message.
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
    /// Cap on agents allowed to speak per decision trigger.
    #[serde(default = "default_max_concurrent_agent_responses")]
    pub max_concurrent_agent_responses: usize,
    /// Interval of the proactive idle check during discussion; doubles as
    /// the idle threshold that wakes quiet agents.
    #[serde(default = "default_idle_check_secs")]
    pub idle_check_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_ai_players: default_num_ai_players(),
            discussion_secs: default_discussion_secs(),
            voting_secs: default_voting_secs(),
            rounds_to_win: default_rounds_to_win(),
            message_cooldown_secs: default_message_cooldown_secs(),
            typing_delay_ms: default_typing_delay_ms(),
            max_concurrent_agent_responses: default_max_concurrent_agent_responses(),
            idle_check_secs: default_idle_check_secs(),
        }
    }
}
