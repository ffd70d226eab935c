// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counts events dropped from the bounded broadcast queue and samples the
//! logging so a sustained overload doesn't itself become a logging
//! overload: the first drop always logs at error, every Nth after that
//! logs at warning.

use std::sync::atomic::{AtomicU64, Ordering};

use gateway_core::constants::DROP_LOG_INTERVAL;
use tracing::{error, warn};

#[derive(Default)]
pub struct DropTracker {
    total: AtomicU64,
    log_interval: u64,
}

impl DropTracker {
    pub fn new() -> Self {
        Self { total: AtomicU64::new(0), log_interval: DROP_LOG_INTERVAL }
    }

    /// Records one dropped event for `reason` and logs per the sampling
    /// policy above.
    pub fn record_drop(&self, reason: &str) {
        let count = self.total.fetch_add(1, Ordering::Relaxed) + 1;
        if count == 1 {
            error!(reason, total = count, "event queue full, dropping oldest event");
        } else if count % self.log_interval == 0 {
            warn!(reason, total = count, "event queue continues to drop events");
        }
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "drop_tracker_tests.rs"]
mod tests;
