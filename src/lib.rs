#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_arguments,
    clippy::too_many_lines
)]

//! # Masquerade Server
//!
//! A multi-room real-time social-deduction game server. One to four humans
//! hide among LLM-driven agents; each round the table discusses a topic,
//! votes, and eliminates a suspect. Humans win by surviving long enough;
//! the agents win the moment a human is voted out.
//!
//! Everything is in-memory: no database, no cloud services. Just run the
//! binary, point a client at the REST API, and attach to the room's
//! WebSocket for live events.

/// REST and WebSocket surface
pub mod api;

/// Orchestration of LLM-driven agents (gating, fallbacks)
pub mod agents;

/// Monotonic clock abstraction so tests can drive timers
pub mod clock;

/// Server configuration and environment variables
pub mod config;

/// Game error kinds and their machine-readable codes
pub mod error;

/// Authoritative per-room game state
pub mod game;

/// LLM provider clients (OpenAI, Anthropic, Groq, canned)
pub mod llm;

/// Structured logging configuration
pub mod logging;

/// Per-room phase orchestrator
pub mod orchestrator;

/// Wire protocol: events, error codes, identifiers
pub mod protocol;

/// Room, broadcast hub, and registry lifecycle
pub mod room;
