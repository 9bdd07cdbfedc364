//! The "should this agent speak now?" decision.

use rand::RngExt;
use std::sync::Arc;

use crate::llm::{AgentProfile, LlmProvider, TableView};
use crate::protocol::Phase;

/// Probability of speaking when the model call fails or returns garbage.
const FALLBACK_SPEAK_PROBABILITY: f64 = 0.3;

/// Ask the model whether the agent would naturally speak now. Any model
/// failure degrades to a coin weighted at [`FALLBACK_SPEAK_PROBABILITY`]
/// so the table never goes silent because a provider hiccuped.
pub async fn should_speak(
    provider: &Arc<dyn LlmProvider>,
    agent: &AgentProfile,
    view: &TableView,
) -> bool {
    match provider.decide(agent, view).await {
        Ok(decision) => {
            tracing::debug!(
                agent = %agent.id,
                should_respond = decision.should_respond,
                reason = %decision.reason,
                "Agent speak decision"
            );
            decision.should_respond
        }
        Err(err) => {
            tracing::warn!(
                agent = %agent.id,
                phase = %Phase::Discussion,
                error = %err,
                "Decision call failed, falling back to weighted coin"
            );
            rand::rng().random_bool(FALLBACK_SPEAK_PROBABILITY)
        }
    }
}
