//! Vote counting, tie-breaking, and the win predicate.

use rand::RngExt;
use std::collections::HashMap;

use crate::protocol::events::VoteCount;
use crate::protocol::{PlayerId, Role, Winner};

/// Aggregate per-target counts, sorted by votes descending then by player
/// number for a stable presentation order.
pub fn count_votes(votes: &HashMap<PlayerId, PlayerId>) -> Vec<VoteCount> {
    let mut counts: HashMap<PlayerId, usize> = HashMap::new();
    for target in votes.values() {
        *counts.entry(*target).or_insert(0) += 1;
    }
    let mut out: Vec<VoteCount> = counts
        .into_iter()
        .map(|(target, votes)| VoteCount { target, votes })
        .collect();
    out.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.target.number().cmp(&b.target.number()))
    });
    out
}

/// Pick the player to eliminate: highest count, ties broken uniformly at
/// random. `None` when no votes were cast at all.
pub fn select_suspect(votes: &HashMap<PlayerId, PlayerId>) -> Option<PlayerId> {
    let counts = count_votes(votes);
    let top = counts.first()?.votes;
    let tied: Vec<PlayerId> = counts
        .iter()
        .take_while(|c| c.votes == top)
        .map(|c| c.target)
        .collect();
    let idx = rand::rng().random_range(0..tied.len());
    // SAFETY: `idx` is produced by `random_range(0..len)` and `tied` holds
    // at least the top entry.
    #[allow(clippy::indexing_slicing)]
    Some(tied[idx])
}

/// The win predicate. `suspect_role` is the role of the player eliminated
/// this round, if any. Humans eliminated in earlier rounds already ended
/// the game, so checking the current suspect is sufficient.
pub fn decide_outcome(
    suspect_role: Option<Role>,
    round: u32,
    rounds_to_win: u32,
) -> Option<Winner> {
    if suspect_role == Some(Role::Human) {
        return Some(Winner::Ai);
    }
    if round >= rounds_to_win {
        return Some(Winner::Human);
    }
    None
}
