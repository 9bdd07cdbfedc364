//! Monotonic time source behind a trait so tests can drive game timers
//! deterministically. All gameplay timing (discussion windows, voting
//! windows, typing delays, cooldowns, idle checks) goes through a
//! [`Clock`]; production code uses [`TokioClock`], tests use
//! [`ManualClock`].
//!
//! Cancellation is handled by the callers: orchestrator loops pair every
//! sleep with the room's `CancellationToken` in a `select!`.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic "now".
    fn now(&self) -> Instant;

    /// Sleep for `dur` of this clock's time.
    async fn sleep(&self, dur: Duration);
}

/// Production clock backed by the tokio timer wheel.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

/// Test clock whose time only moves when [`ManualClock::advance`] is
/// called. Sleepers wake as soon as the advanced time passes their
/// deadline.
pub struct ManualClock {
    epoch: Instant,
    elapsed: Mutex<Duration>,
    tick: Notify,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            tick: Notify::new(),
        }
    }

    pub fn advance(&self, dur: Duration) {
        {
            let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
            *elapsed += dur;
        }
        self.tick.notify_waiters();
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = *self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        self.epoch + elapsed
    }

    async fn sleep(&self, dur: Duration) {
        let deadline = self.now() + dur;
        loop {
            if self.now() >= deadline {
                return;
            }
            let notified = self.tick.notified();
            // Re-check after arming the waiter so an advance between the
            // check and the await cannot be missed.
            if self.now() >= deadline {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn manual_clock_sleep_wakes_on_advance() {
        let clock = Arc::new(ManualClock::new());
        let sleeper = {
            let clock = clock.clone();
            tokio::spawn(async move { clock.sleep(Duration::from_secs(10)).await })
        };

        // Not enough time: the sleeper must stay parked.
        clock.advance(Duration::from_secs(4));
        tokio::task::yield_now().await;
        assert!(!sleeper.is_finished());

        clock.advance(Duration::from_secs(7));
        tokio::time::timeout(Duration::from_secs(1), sleeper)
            .await
            .expect("sleeper should wake after advance")
            .unwrap();
    }

    #[tokio::test]
    async fn manual_clock_now_tracks_advances() {
        let clock = ManualClock::new();
        let before = clock.now();
        clock.advance(Duration::from_secs(30));
        assert_eq!(clock.now() - before, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn tokio_clock_sleeps() {
        let clock = TokioClock;
        let start = clock.now();
        clock.sleep(Duration::from_millis(20)).await;
        assert!(clock.now() - start >= Duration::from_millis(20));
    }
}
