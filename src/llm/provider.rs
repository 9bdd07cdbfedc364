//! The provider interface agents talk to.

use async_trait::async_trait;
use serde::Deserialize;

use super::LlmError;
use crate::protocol::{ChatMessage, PlayerId};

/// The calling agent, as the model should see it.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub id: PlayerId,
    pub personality: String,
}

/// Snapshot of the table visible to an agent: the round topic, the chat
/// history as everyone sees it, and the visible names of every active
/// player. Names are anchored exactly as they appear in chat (`Player 3`),
/// never internal labels.
#[derive(Debug, Clone)]
pub struct TableView {
    pub topic: String,
    pub history: Vec<ChatMessage>,
    pub visible_names: Vec<String>,
}

/// Structured output of a `decide` call.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub should_respond: bool,
    #[serde(default)]
    pub reason: String,
}

/// Structured output of a `generate_vote` call. `vote` is a visible name;
/// the caller maps it back to a canonical player id.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Ballot {
    pub vote: String,
    #[serde(default)]
    pub reason: String,
}

/// Narrow interface to the language model. One method per agent action.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Should this agent speak now?
    async fn decide(&self, agent: &AgentProfile, view: &TableView) -> Result<Decision, LlmError>;

    /// Produce the agent's next utterance.
    async fn generate_message(
        &self,
        agent: &AgentProfile,
        view: &TableView,
    ) -> Result<String, LlmError>;

    /// Pick a player to vote for. `candidates` holds the visible names of
    /// active players other than the agent itself.
    async fn generate_vote(
        &self,
        agent: &AgentProfile,
        view: &TableView,
        candidates: &[String],
    ) -> Result<Ballot, LlmError>;
}
