//! Configuration module for Masquerade.
//!
//! Configuration is a serde tree loaded from (highest precedence first)
//! an inline-JSON environment variable, a file path environment variable,
//! `config.json` in the working directory, and compiled defaults, with
//! per-field environment overrides applied on top. See [`loader::load`].

pub mod ai;
pub mod defaults;
pub mod game;
pub mod loader;
pub mod logging;
pub mod server;
pub mod types;
pub mod validation;

pub use ai::{AiConfig, AiProviderKind};
pub use game::GameConfig;
pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use server::ServerConfig;
pub use types::Config;
pub use validation::validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.port, 8765);
        assert_eq!(config.host, "0.0.0.0");

        assert_eq!(config.game.num_ai_players, 4);
        assert_eq!(config.game.discussion_secs, 180);
        assert_eq!(config.game.voting_secs, 60);
        assert_eq!(config.game.rounds_to_win, 3);
        assert_eq!(config.game.message_cooldown_secs, 15);
        assert_eq!(config.game.max_concurrent_agent_responses, 2);

        assert_eq!(config.ai.temperature, 0.7);
        assert_eq!(config.ai.request_timeout_secs, 12);
        assert!(config.ai.api_key.is_none());

        assert_eq!(config.server.completed_room_linger_secs, 60);
        assert_eq!(config.server.cors_origins, "*");

        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.logging.filename, "server.log");
        assert_eq!(config.logging.rotation, "daily");
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config.port, deserialized.port);
        assert_eq!(config.game.num_ai_players, deserialized.game.num_ai_players);
        assert_eq!(config.ai.provider, deserialized.ai.provider);
        assert_eq!(
            config.server.completed_room_linger_secs,
            deserialized.server.completed_room_linger_secs
        );
    }

    #[test]
    fn test_log_level_as_str() {
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[test]
    fn test_redacted_view_hides_api_key() {
        let mut config = Config::default();
        config.ai.api_key = Some("sk-secret".into());
        let public = config.redacted();
        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["ai"]["api_key"], serde_json::Value::Null);
    }
}
