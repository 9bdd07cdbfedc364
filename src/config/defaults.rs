//! Default value functions referenced by `#[serde(default = ...)]`.

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8765
}

// Server section

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub fn default_completed_room_linger_secs() -> u64 {
    60
}

pub fn default_empty_room_grace_secs() -> u64 {
    600
}

pub fn default_sweep_interval_secs() -> u64 {
    5
}

pub fn default_event_buffer_size() -> usize {
    256
}

pub fn default_rooms_per_page() -> u32 {
    10
}

// Game section

pub fn default_num_ai_players() -> u8 {
    4
}

pub fn default_discussion_secs() -> u64 {
    180
}

pub fn default_voting_secs() -> u64 {
    60
}

pub fn default_rounds_to_win() -> u32 {
    3
}

pub fn default_message_cooldown_secs() -> u64 {
    15
}

pub fn default_typing_delay_ms() -> u64 {
    1500
}

pub fn default_max_concurrent_agent_responses() -> usize {
    2
}

pub fn default_idle_check_secs() -> u64 {
    10
}

// AI section

pub fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_ai_temperature() -> f32 {
    0.7
}

pub fn default_ai_request_timeout_secs() -> u64 {
    12
}

pub fn default_ai_max_concurrent_requests() -> usize {
    8
}

// Logging section

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_log_rotation() -> String {
    "daily".to_string()
}
