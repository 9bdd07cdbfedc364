//! Agent behavior built on top of the LLM provider: deciding when to
//! speak, composing utterances, and casting votes, each with a gameplay
//! fallback so a model failure never stalls a room or unmasks an agent.

pub mod decision;
pub mod roster;
pub mod speaker;
pub mod voter;
