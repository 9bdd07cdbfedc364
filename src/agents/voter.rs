//! Agent vote casting.

use rand::RngExt;
use std::sync::Arc;

use crate::llm::{AgentProfile, LlmProvider, TableView};
use crate::protocol::{Phase, PlayerId};

/// Ask the model which active player the agent votes for, mapping the
/// returned visible name back to a canonical id. Malformed output, an
/// unknown name, a self-vote, or a provider error all degrade to a
/// uniform random choice over the candidates.
///
/// `candidates` must be active, non-self, non-eliminated players. Returns
/// `None` only when the candidate set is empty.
pub async fn cast(
    provider: &Arc<dyn LlmProvider>,
    agent: &AgentProfile,
    view: &TableView,
    candidates: &[PlayerId],
) -> Option<PlayerId> {
    if candidates.is_empty() {
        return None;
    }

    let names: Vec<String> = candidates.iter().map(ToString::to_string).collect();

    match provider.generate_vote(agent, view, &names).await {
        Ok(ballot) => {
            let picked = ballot.vote.trim();
            if let Some(target) = candidates.iter().find(|c| c.to_string() == picked) {
                tracing::debug!(
                    agent = %agent.id,
                    target = %target,
                    reason = %ballot.reason,
                    "Agent vote"
                );
                return Some(*target);
            }
            tracing::warn!(
                agent = %agent.id,
                phase = %Phase::Voting,
                vote = %ballot.vote,
                "Vote named a player outside the candidate set, falling back to random"
            );
        }
        Err(err) => {
            tracing::warn!(
                agent = %agent.id,
                phase = %Phase::Voting,
                error = %err,
                "Vote generation failed, falling back to random"
            );
        }
    }

    let idx = rand::rng().random_range(0..candidates.len());
    // SAFETY: `idx` is produced by `random_range(0..len)` and the set is
    // non-empty (checked above).
    #[allow(clippy::indexing_slicing)]
    Some(candidates[idx])
}
