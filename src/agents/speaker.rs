//! Agent utterance generation.

use rand::RngExt;
use std::sync::Arc;

use crate::llm::{AgentProfile, LlmProvider, TableView};
use crate::protocol::Phase;

/// Bland, in-character lines used when the model fails. None of them may
/// hint that the sender is not human.
const FALLBACK_PHRASES: &[&str] = &[
    "Yeah, I see what you mean.",
    "Honestly, same here.",
    "Ha, fair enough.",
    "I was just thinking that.",
    "Good point, hadn't thought of it that way.",
    "Hmm, hard to disagree with that.",
];

/// Compose the agent's next chat message. A model failure yields a bland
/// agreement phrase rather than an error; game progress beats eloquence.
pub async fn compose(
    provider: &Arc<dyn LlmProvider>,
    agent: &AgentProfile,
    view: &TableView,
) -> String {
    match provider.generate_message(agent, view).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(
                agent = %agent.id,
                phase = %Phase::Discussion,
                error = %err,
                "Message generation failed, using fallback phrase"
            );
            let idx = rand::rng().random_range(0..FALLBACK_PHRASES.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`.
            #[allow(clippy::indexing_slicing)]
            FALLBACK_PHRASES[idx].to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CannedProvider;
    use crate::protocol::PlayerId;

    fn agent() -> AgentProfile {
        AgentProfile {
            id: PlayerId::new(6),
            personality: "test".into(),
        }
    }

    fn view() -> TableView {
        TableView {
            topic: "t".into(),
            history: vec![],
            visible_names: vec![],
        }
    }

    #[tokio::test]
    async fn passes_through_model_text() {
        let provider: Arc<dyn LlmProvider> =
            Arc::new(CannedProvider::new().with_message("waffles forever"));
        assert_eq!(compose(&provider, &agent(), &view()).await, "waffles forever");
    }

    #[tokio::test]
    async fn fallback_never_breaks_character() {
        let provider: Arc<dyn LlmProvider> = Arc::new(CannedProvider::failing());
        for _ in 0..20 {
            let text = compose(&provider, &agent(), &view()).await;
            assert!(FALLBACK_PHRASES.contains(&text.as_str()));
            let lowered = text.to_lowercase();
            assert!(!lowered.contains("ai"));
            assert!(!lowered.contains("model"));
        }
    }
}
