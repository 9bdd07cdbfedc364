//! Root configuration type.

use serde::{Deserialize, Serialize};

use super::ai::AiConfig;
use super::defaults::{default_host, default_port};
use super::game::GameConfig;
use super::logging::LoggingConfig;
use super::server::ServerConfig;

/// Root configuration struct for Masquerade.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            server: ServerConfig::default(),
            game: GameConfig::default(),
            ai: AiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Copy of the configuration with secrets removed, for the `/config`
    /// endpoint and `--print-config`.
    pub fn redacted(&self) -> Self {
        let mut public = self.clone();
        public.ai.api_key = None;
        public
    }
}
