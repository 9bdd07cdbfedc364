//! Hosted chat-completion providers.
//!
//! OpenAI and Groq speak the same chat-completions wire format; Anthropic
//! has its own messages API. All three reduce to "system prompt + user
//! prompt in, text out", which is all the game needs.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::prompts;
use super::provider::{AgentProfile, Ballot, Decision, LlmProvider, TableView};
use super::LlmError;
use crate::config::AiProviderKind;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Token ceiling for a single utterance; these are one-line chat messages.
const MAX_OUTPUT_TOKENS: u32 = 256;

pub struct HttpChatProvider {
    client: reqwest::Client,
    kind: AiProviderKind,
    model: String,
    temperature: f32,
    api_key: String,
    deadline: Duration,
    limiter: Arc<Semaphore>,
}

impl HttpChatProvider {
    pub fn new(
        kind: AiProviderKind,
        model: String,
        temperature: f32,
        api_key: String,
        deadline: Duration,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            kind,
            model,
            temperature,
            api_key,
            deadline,
            limiter: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    /// One bounded chat completion: acquire a concurrency permit, send,
    /// and enforce the call deadline.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        tokio::time::timeout(self.deadline, self.send(system, user))
            .await
            .map_err(|_| LlmError::Timeout)?
    }

    async fn send(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = match self.kind {
            AiProviderKind::Openai => self.chat_completions_request(OPENAI_URL, system, user),
            AiProviderKind::Groq => self.chat_completions_request(GROQ_URL, system, user),
            AiProviderKind::Anthropic => self.anthropic_request(system, user),
        };

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Request(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        self.extract_text(&body)
            .ok_or_else(|| LlmError::Malformed("response missing message text".to_string()))
    }

    fn chat_completions_request(
        &self,
        url: &str,
        system: &str,
        user: &str,
    ) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "temperature": self.temperature,
                "max_tokens": MAX_OUTPUT_TOKENS,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": user},
                ],
            }))
    }

    fn anthropic_request(&self, system: &str, user: &str) -> reqwest::RequestBuilder {
        self.client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": self.model,
                "temperature": self.temperature,
                "max_tokens": MAX_OUTPUT_TOKENS,
                "system": system,
                "messages": [
                    {"role": "user", "content": user},
                ],
            }))
    }

    fn extract_text(&self, body: &Value) -> Option<String> {
        match self.kind {
            AiProviderKind::Openai | AiProviderKind::Groq => body
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_string),
            AiProviderKind::Anthropic => body
                .pointer("/content/0/text")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
        let object = prompts::extract_json_object(raw)
            .ok_or_else(|| LlmError::Malformed(format!("no JSON object in output: {raw:?}")))?;
        serde_json::from_str(object).map_err(|e| LlmError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for HttpChatProvider {
    async fn decide(&self, agent: &AgentProfile, view: &TableView) -> Result<Decision, LlmError> {
        let system = prompts::persona_system_prompt(agent, view);
        let user = prompts::decision_prompt(agent, view);
        let raw = self.complete(&system, &user).await?;
        Self::parse_json(&raw)
    }

    async fn generate_message(
        &self,
        agent: &AgentProfile,
        view: &TableView,
    ) -> Result<String, LlmError> {
        let system = prompts::persona_system_prompt(agent, view);
        let user = prompts::message_prompt(agent, view);
        let text = self.complete(&system, &user).await?;
        let trimmed = text.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return Err(LlmError::Malformed("empty utterance".to_string()));
        }
        Ok(trimmed.to_string())
    }

    async fn generate_vote(
        &self,
        agent: &AgentProfile,
        view: &TableView,
        candidates: &[String],
    ) -> Result<Ballot, LlmError> {
        let system = prompts::persona_system_prompt(agent, view);
        let user = prompts::vote_prompt(agent, view, candidates);
        let raw = self.complete(&system, &user).await?;
        Self::parse_json(&raw)
    }
}
