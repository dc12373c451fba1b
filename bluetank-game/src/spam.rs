//! Per-actor tap-spam detection over a one-second sliding window.
//!
//! Windows live in memory only. Idle actors are evicted after a TTL and the
//! number of tracked actors is capped, so the detector stays bounded no
//! matter how many distinct actors ever tap.
use chrono::{DateTime, TimeDelta, Utc};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::constants::{SPAM_TAP_THRESHOLD, SPAM_WINDOW_MS};
use crate::state::OwnerId;

type TapTimes = SmallVec<[DateTime<Utc>; 8]>;

#[derive(Debug, Clone, Default)]
struct TapWindow {
    taps: TapTimes,
    last_seen: Option<DateTime<Utc>>,
}

impl TapWindow {
    fn prune(&mut self, now: DateTime<Utc>) {
        let window = TimeDelta::milliseconds(SPAM_WINDOW_MS);
        self.taps.retain(|tap| now - *tap < window);
    }

    fn count_at(&self, now: DateTime<Utc>) -> usize {
        let window = TimeDelta::milliseconds(SPAM_WINDOW_MS);
        self.taps.iter().filter(|tap| now - **tap < window).count()
    }
}

/// Bounded, injectable tap tracker keyed by actor.
#[derive(Debug, Clone)]
pub struct SpamDetector {
    windows: HashMap<OwnerId, TapWindow>,
    ttl: TimeDelta,
    max_actors: usize,
}

impl SpamDetector {
    /// `ttl` is how long an actor may stay idle before its window is dropped;
    /// `max_actors` caps the number of tracked actors (at least one).
    #[must_use]
    pub fn new(ttl: TimeDelta, max_actors: usize) -> Self {
        Self {
            windows: HashMap::new(),
            ttl,
            max_actors: max_actors.max(1),
        }
    }

    /// Record a tap and return the number of taps in the last second, this one included.
    pub fn record_tap(&mut self, actor: &OwnerId, now: DateTime<Utc>) -> usize {
        if !self.windows.contains_key(actor) && self.windows.len() >= self.max_actors {
            self.make_room(now);
        }
        let window = self.windows.entry(actor.clone()).or_default();
        window.prune(now);
        window.taps.push(now);
        window.last_seen = Some(now);
        window.taps.len()
    }

    /// Whether `actor` tapped more than six times within the last second.
    #[must_use]
    pub fn is_spamming(&self, actor: &OwnerId, now: DateTime<Utc>) -> bool {
        self.taps_in_window(actor, now) > SPAM_TAP_THRESHOLD
    }

    #[must_use]
    pub fn taps_in_window(&self, actor: &OwnerId, now: DateTime<Utc>) -> usize {
        self.windows
            .get(actor)
            .map_or(0, |window| window.count_at(now))
    }

    /// Drop actors idle for longer than the TTL. Returns how many were evicted.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        let ttl = self.ttl;
        self.windows
            .retain(|_, window| window.last_seen.is_some_and(|seen| now - seen <= ttl));
        before - self.windows.len()
    }

    #[must_use]
    pub fn tracked_actors(&self) -> usize {
        self.windows.len()
    }

    fn make_room(&mut self, now: DateTime<Utc>) {
        if self.sweep(now) > 0 {
            return;
        }
        let stalest = self
            .windows
            .iter()
            .min_by_key(|(_, window)| window.last_seen)
            .map(|(actor, _)| actor.clone());
        if let Some(actor) = stalest {
            self.windows.remove(&actor);
        }
    }
}

impl Default for SpamDetector {
    fn default() -> Self {
        Self::new(TimeDelta::minutes(5), 10_000)
    }
}
