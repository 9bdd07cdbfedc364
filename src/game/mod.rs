//! Authoritative per-room game state and its pure helpers.

pub mod slots;
pub mod state;
pub mod tally;

pub use slots::SlotPool;
pub use state::{GameSnapshot, GameState};
