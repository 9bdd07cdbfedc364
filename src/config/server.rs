//! Server behavior configuration: room lifecycle timing, delivery buffers,
//! CORS.

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_completed_room_linger_secs, default_cors_origins, default_empty_room_grace_secs,
    default_event_buffer_size, default_rooms_per_page, default_sweep_interval_secs,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Comma-separated allowed CORS origins, or `*`.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// How long a completed room stays readable before the sweeper
    /// destroys it.
    #[serde(default = "default_completed_room_linger_secs")]
    pub completed_room_linger_secs: u64,
    /// How long a waiting room nobody has joined may sit before the
    /// sweeper reaps it.
    #[serde(default = "default_empty_room_grace_secs")]
    pub empty_room_grace_secs: u64,
    /// Interval of the registry sweeper task.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Outbound event queue depth per connection. A connection that falls
    /// this far behind is dropped.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
    /// Default page size for room listings.
    #[serde(default = "default_rooms_per_page")]
    pub rooms_per_page: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            completed_room_linger_secs: default_completed_room_linger_secs(),
            empty_room_grace_secs: default_empty_room_grace_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            event_buffer_size: default_event_buffer_size(),
            rooms_per_page: default_rooms_per_page(),
        }
    }
}
