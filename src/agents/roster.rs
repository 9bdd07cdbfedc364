//! Seat assignment, personalities, and discussion topics.

use rand::RngExt;

/// Personalities handed to agents at room creation, cycled in shuffled
/// order so no two rooms feel alike.
const PERSONALITIES: &[&str] = &[
    "cheerful and talkative, loves sharing little anecdotes",
    "dry and skeptical, economical with words",
    "easily excited, types fast and uses exclamation marks",
    "laid-back and agreeable, goes with the flow",
    "curious question-asker who draws others out",
    "mildly sarcastic but friendly underneath",
    "earnest and literal, occasionally misses jokes",
    "competitive and opinionated, enjoys a friendly argument",
    "warm peacemaker who smooths over disagreements",
    "distracted daydreamer who drifts off topic",
];

/// Topics sampled at the start of every round.
const TOPICS: &[&str] = &[
    "the best breakfast food",
    "a movie everyone should watch once",
    "the most overrated tourist destination",
    "whether cats or dogs make better roommates",
    "the ideal weekend with no obligations",
    "a skill you wish you had learned earlier",
    "the strangest food combination that works",
    "whether mornings or nights are better for getting things done",
    "a small purchase that improved your life",
    "the best era of music",
    "what superpower would be most useful day to day",
    "whether pineapple belongs on pizza",
    "the most memorable teacher you ever had",
    "a hobby you could talk about for hours",
    "what you would do with a surprise day off tomorrow",
];

/// Draw the numbers `1..=total` in uniformly random order. The first
/// `num_ai` become agent seats; the remainder is the human slot pool, so
/// agent numbers are non-sequential and indistinguishable from human ones.
pub fn draw_numbers(total: u8) -> Vec<u8> {
    let mut numbers: Vec<u8> = (1..=total).collect();
    let mut rng = rand::rng();
    // Fisher-Yates
    for i in (1..numbers.len()).rev() {
        let j = rng.random_range(0..=i);
        numbers.swap(i, j);
    }
    numbers
}

/// Personality for the `index`-th agent seat, offset randomly per room.
pub fn personality(offset: usize, index: usize) -> String {
    // SAFETY: the modulo keeps the index within the slice.
    #[allow(clippy::indexing_slicing)]
    PERSONALITIES[(offset + index) % PERSONALITIES.len()].to_string()
}

/// Random per-room offset into the personality table.
pub fn personality_offset() -> usize {
    rand::rng().random_range(0..PERSONALITIES.len())
}

/// Sample a round topic.
pub fn pick_topic() -> String {
    let idx = rand::rng().random_range(0..TOPICS.len());
    // SAFETY: `idx` is produced by `random_range(0..len)`.
    #[allow(clippy::indexing_slicing)]
    TOPICS[idx].to_string()
}
