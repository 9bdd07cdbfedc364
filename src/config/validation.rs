//! Configuration validation.

use super::Config;

/// Validate a loaded configuration. Returns a multi-line error listing
/// every violated constraint, or `Ok(())`.
pub fn validate(config: &Config) -> Result<(), String> {
    let mut problems = Vec::new();

    if !(2..=10).contains(&config.game.num_ai_players) {
        problems.push(format!(
            "game.num_ai_players must be between 2 and 10 (got {})",
            config.game.num_ai_players
        ));
    }

    if !(0.0..=1.0).contains(&config.ai.temperature) {
        problems.push(format!(
            "ai.temperature must be between 0 and 1 (got {})",
            config.ai.temperature
        ));
    }

    if config.game.rounds_to_win == 0 {
        problems.push("game.rounds_to_win must be at least 1".to_string());
    }

    if config.game.discussion_secs == 0 {
        problems.push("game.discussion_secs must be at least 1".to_string());
    }

    if config.game.voting_secs == 0 {
        problems.push("game.voting_secs must be at least 1".to_string());
    }

    if config.ai.max_concurrent_requests == 0 {
        problems.push("ai.max_concurrent_requests must be at least 1".to_string());
    }

    if config
        .ai
        .api_key
        .as_deref()
        .map_or(true, |k| k.trim().is_empty())
    {
        problems.push(
            "ai.api_key is required (set LLM_API_KEY or MASQUERADE__AI__API_KEY)".to_string(),
        );
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}
