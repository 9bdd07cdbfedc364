//! LLM provider clients.
//!
//! Agents reach the model through the narrow [`LlmProvider`] interface:
//! `decide` ("should this agent speak now?"), `generate_message`, and
//! `generate_vote`. Providers are interchangeable; [`canned::CannedProvider`]
//! returns scripted responses for tests.
//!
//! Providers never surface errors to game clients; callers in
//! [`crate::agents`] absorb every [`LlmError`] with a gameplay fallback.

pub mod canned;
pub mod http;
pub mod prompts;
pub mod provider;

use std::sync::Arc;

use crate::config::AiConfig;

pub use canned::CannedProvider;
pub use http::HttpChatProvider;
pub use provider::{AgentProfile, Ballot, Decision, LlmProvider, TableView};

/// Errors from the model backend. Absorbed by agent-level fallbacks and
/// logged with the agent id and phase; never propagated to clients.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model call exceeded its deadline")]
    Timeout,
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model returned malformed output: {0}")]
    Malformed(String),
}

/// Build the configured HTTP provider.
pub fn build_provider(cfg: &AiConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let api_key = cfg
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("ai.api_key is required (set LLM_API_KEY)"))?;
    Ok(Arc::new(HttpChatProvider::new(
        cfg.provider,
        cfg.model.clone(),
        cfg.temperature,
        api_key,
        std::time::Duration::from_secs(cfg.request_timeout_secs),
        cfg.max_concurrent_requests,
    )))
}
