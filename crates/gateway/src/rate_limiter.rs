// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sliding-window per-connection rate limiter with bounded memory and an
//! eviction penalty that makes eviction-then-reconnect no cheaper than
//! staying connected.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use gateway_core::constants::{EVICTION_PENALTY_TTL, EVICTION_PERCENTAGE, MAX_TRACKED_CONNECTIONS};
use tracing::warn;

struct Tracked {
    hits: VecDeque<Instant>,
    penalty_seeded_at: Option<Instant>,
}

/// Tracks message timestamps per connection id within a sliding window.
/// Bounded to `max_tracked` entries; past that, the oldest fraction is
/// evicted and a penalty record is kept so a freshly-reconnected id that
/// reappears before the penalty TTL expires doesn't get a clean window.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    max_tracked: usize,
    eviction_penalty_ttl: Duration,
    entries: HashMap<String, Tracked>,
    eviction_order: VecDeque<String>,
    penalties: HashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            max_tracked: MAX_TRACKED_CONNECTIONS,
            eviction_penalty_ttl: EVICTION_PENALTY_TTL,
            entries: HashMap::new(),
            eviction_order: VecDeque::new(),
            penalties: HashMap::new(),
        }
    }

    /// Returns `true` if `id` may send another message right now, and
    /// records the attempt either way.
    pub fn check(&mut self, id: &str, now: Instant) -> bool {
        if !self.entries.contains_key(id) {
            self.admit(id, now);
        }

        let entry = self.entries.get_mut(id).expect("just admitted");
        while let Some(&front) = entry.hits.front() {
            if now.duration_since(front) > self.window {
                entry.hits.pop_front();
            } else {
                break;
            }
        }

        let effective_limit = self.effective_limit(id, now);
        if entry.hits.len() as u32 >= effective_limit {
            return false;
        }
        entry.hits.push_back(now);
        true
    }

    fn effective_limit(&self, id: &str, now: Instant) -> u32 {
        if let Some(seeded) = self.penalties.get(id).and_then(|v| v.first()) {
            if now.duration_since(*seeded) <= self.eviction_penalty_ttl {
                return self.limit.saturating_sub(1).max(1);
            }
        }
        self.limit
    }

    fn admit(&mut self, id: &str, now: Instant) {
        if self.entries.len() >= self.max_tracked {
            self.evict(now);
        }
        let penalty_seeded_at = self.penalties.get(id).and_then(|v| v.first()).copied();
        self.entries.insert(
            id.to_string(),
            Tracked { hits: VecDeque::new(), penalty_seeded_at },
        );
        self.eviction_order.push_back(id.to_string());
    }

    fn evict(&mut self, now: Instant) {
        let to_evict = (self.max_tracked * EVICTION_PERCENTAGE / 100).max(1);
        for _ in 0..to_evict {
            let Some(id) = self.eviction_order.pop_front() else { break };
            if let Some(tracked) = self.entries.remove(&id) {
                self.seed_penalty(&id, tracked, now);
            }
        }
        warn!(evicted = to_evict, "rate limiter tracking table full, evicting oldest entries");
    }

    /// Seeds a penalty so that, if this id reconnects before the TTL
    /// expires, its window isn't reset to full capacity. Timestamps are
    /// synthesized across the evicted entry's own window so the reappeared
    /// connection starts partially throttled rather than wide open.
    fn seed_penalty(&mut self, id: &str, tracked: Tracked, now: Instant) {
        let count = tracked.hits.len().min(self.max_tracked / EVICTION_PERCENTAGE.max(1));
        if count == 0 {
            return;
        }
        let window_start = now - self.window;
        let window_secs = self.window.as_secs_f64();
        let denom = (count + 1) as f64;
        let seeded: Vec<Instant> = (0..count)
            .map(|i| window_start + Duration::from_secs_f64(((i + 1) as f64) * window_secs / denom))
            .collect();
        self.penalties.insert(id.to_string(), seeded);
        let _ = tracked.penalty_seeded_at;
    }

    /// Drops penalty records older than the TTL; call periodically from
    /// the cleanup worker.
    pub fn sweep_expired_penalties(&mut self, now: Instant) {
        self.penalties.retain(|_, seeded| {
            seeded
                .first()
                .map(|first| now.duration_since(*first) <= self.eviction_penalty_ttl)
                .unwrap_or(false)
        });
    }

    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "rate_limiter_tests.rs"]
mod tests;
