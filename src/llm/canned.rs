//! Scripted in-memory provider for tests.
//!
//! Deterministic by default: always willing to speak, fixed utterance,
//! votes for a configured target (or the first candidate). Optional
//! artificial latency makes suspension-window races reproducible, and the
//! instrumentation counters let tests assert the single-flight property.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::provider::{AgentProfile, Ballot, Decision, LlmProvider, TableView};
use super::LlmError;
use crate::protocol::PlayerId;

#[derive(Default)]
pub struct CannedProvider {
    should_respond: bool,
    message: String,
    vote_target: Option<String>,
    latency: Duration,
    /// Extra latency applied to `generate_message` only, so tests can keep
    /// decisions fast while a generation straddles a phase boundary.
    message_latency: Duration,
    fail_all: bool,

    decide_calls: AtomicUsize,
    message_calls: AtomicUsize,
    vote_calls: AtomicUsize,
    /// Agents with a message generation currently in flight.
    inflight: Mutex<HashMap<PlayerId, usize>>,
    /// Times a second generation entered while one was already in flight
    /// for the same agent. Stays zero when single-flight holds.
    overlaps: AtomicUsize,
}

impl CannedProvider {
    pub fn new() -> Self {
        Self {
            should_respond: true,
            message: "Fair point, I was thinking the same thing.".to_string(),
            ..Self::default()
        }
    }

    /// Never volunteers to speak. Useful for tests that drive phases
    /// without chat noise.
    pub fn quiet() -> Self {
        Self {
            should_respond: false,
            ..Self::new()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_message_latency(mut self, latency: Duration) -> Self {
        self.message_latency = latency;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// All agents vote for this visible name.
    pub fn with_vote_target(mut self, target: impl Into<String>) -> Self {
        self.vote_target = Some(target.into());
        self
    }

    /// Every call errors, exercising the gameplay fallbacks.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn decide_calls(&self) -> usize {
        self.decide_calls.load(Ordering::SeqCst)
    }

    pub fn message_calls(&self) -> usize {
        self.message_calls.load(Ordering::SeqCst)
    }

    pub fn vote_calls(&self) -> usize {
        self.vote_calls.load(Ordering::SeqCst)
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            // Jitter keeps concurrent tasks from finishing in lockstep.
            let jitter = Duration::from_millis(fastrand::u64(0..=10));
            tokio::time::sleep(self.latency + jitter).await;
        }
    }

    fn fail_if_configured(&self) -> Result<(), LlmError> {
        if self.fail_all {
            Err(LlmError::Malformed("canned failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn enter(&self, agent: PlayerId) {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        let count = inflight.entry(agent).or_insert(0);
        if *count > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        *count += 1;
    }

    fn exit(&self, agent: PlayerId) {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = inflight.get_mut(&agent) {
            *count = count.saturating_sub(1);
        }
    }
}

#[async_trait]
impl LlmProvider for CannedProvider {
    async fn decide(&self, _agent: &AgentProfile, _view: &TableView) -> Result<Decision, LlmError> {
        self.decide_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.fail_if_configured()?;
        Ok(Decision {
            should_respond: self.should_respond,
            reason: "scripted".to_string(),
        })
    }

    async fn generate_message(
        &self,
        agent: &AgentProfile,
        _view: &TableView,
    ) -> Result<String, LlmError> {
        self.message_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(agent.id);
        self.simulate_latency().await;
        if !self.message_latency.is_zero() {
            tokio::time::sleep(self.message_latency).await;
        }
        self.exit(agent.id);
        self.fail_if_configured()?;
        Ok(self.message.clone())
    }

    async fn generate_vote(
        &self,
        _agent: &AgentProfile,
        _view: &TableView,
        candidates: &[String],
    ) -> Result<Ballot, LlmError> {
        self.vote_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.fail_if_configured()?;
        let vote = match &self.vote_target {
            Some(target) => target.clone(),
            None => candidates
                .first()
                .cloned()
                .ok_or_else(|| LlmError::Malformed("no candidates".to_string()))?,
        };
        Ok(Ballot {
            vote,
            reason: "scripted".to_string(),
        })
    }
}
