//! Cancellable phase deadline timer for SketchRelay.
//!
//! A [`PhaseTimer`] holds at most one pending deadline, tagged with a key
//! identifying the phase it belongs to (for rooms: the phase and round
//! number). Arming the timer replaces whatever deadline was pending, so a
//! room can never have two live deadlines.
//!
//! # Integration
//!
//! The timer is owned by a room actor and polled as one branch of its
//! `tokio::select!` loop, which makes expiry just another serialized event
//! next to player commands:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = receiver.recv() => { /* handle command, then re-arm or cancel */ }
//!         expiry = timer.expired() => {
//!             if game.deadline() == Some(expiry.key) { /* auto-advance */ }
//!         }
//!     }
//! }
//! ```
//!
//! When nothing is armed, [`PhaseTimer::expired`] pends forever and
//! `select!` keeps serving the other branches.

use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// A deadline that fired. `key` is the key it was armed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry<K> {
    pub key: K,
    /// How long after the scheduled instant the actor got to it.
    pub late_by: Duration,
}

/// Counters kept over the life of a timer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Times a deadline was scheduled.
    pub armed: u64,
    /// Deadlines discarded before firing, either by [`PhaseTimer::cancel`]
    /// or by being replaced through [`PhaseTimer::arm`].
    pub cancelled: u64,
    /// Deadlines that fired.
    pub fired: u64,
}

/// Single-slot deadline timer. One per room actor.
pub struct PhaseTimer<K> {
    pending: Option<(Instant, K)>,
    stats: TimerStats,
}

impl<K> PhaseTimer<K>
where
    K: Copy + PartialEq + fmt::Debug,
{
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self {
            pending: None,
            stats: TimerStats::default(),
        }
    }

    /// Schedules `key` to fire after `after`, discarding any pending
    /// deadline first.
    pub fn arm(&mut self, key: K, after: Duration) {
        if let Some((_, old)) = self.pending.take() {
            self.stats.cancelled += 1;
            debug!(?old, new = ?key, "replacing pending deadline");
        }
        self.pending = Some((Instant::now() + after, key));
        self.stats.armed += 1;
        debug!(?key, after_ms = after.as_millis() as u64, "deadline armed");
    }

    /// Drops the pending deadline, returning its key. Idempotent.
    pub fn cancel(&mut self) -> Option<K> {
        let (_, key) = self.pending.take()?;
        self.stats.cancelled += 1;
        debug!(?key, "deadline cancelled");
        Some(key)
    }

    /// Key of the pending deadline, if any.
    pub fn armed_key(&self) -> Option<K> {
        self.pending.map(|(_, key)| key)
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Waits for the pending deadline and disarms the timer.
    ///
    /// Pends forever while disarmed. Cancel-safe: dropping the future
    /// before it resolves leaves the deadline pending.
    pub async fn expired(&mut self) -> Expiry<K> {
        let Some((at, key)) = self.pending else {
            return std::future::pending().await;
        };

        time::sleep_until(at).await;

        self.pending = None;
        self.stats.fired += 1;
        let late_by = Instant::now().saturating_duration_since(at);
        trace!(?key, late_ms = late_by.as_millis() as u64, "deadline fired");
        Expiry { key, late_by }
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> &TimerStats {
        &self.stats
    }
}

impl<K> Default for PhaseTimer<K>
where
    K: Copy + PartialEq + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
