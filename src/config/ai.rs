//! LLM backend configuration.

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_ai_max_concurrent_requests, default_ai_model, default_ai_request_timeout_secs,
    default_ai_temperature,
};

/// Which hosted model API backs the agents.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderKind {
    #[default]
    Openai,
    Anthropic,
    Groq,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: AiProviderKind,
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Sampling temperature, 0–1.
    #[serde(default = "default_ai_temperature")]
    pub temperature: f32,
    /// API key for the selected provider. Required to start the server;
    /// usually supplied via the `LLM_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper-bound deadline for a single model call. Exceeding it yields
    /// the per-call fallback rather than an error to the client.
    #[serde(default = "default_ai_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Process-wide cap on in-flight model calls.
    #[serde(default = "default_ai_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProviderKind::default(),
            model: default_ai_model(),
            temperature: default_ai_temperature(),
            api_key: None,
            request_timeout_secs: default_ai_request_timeout_secs(),
            max_concurrent_requests: default_ai_max_concurrent_requests(),
        }
    }
}
