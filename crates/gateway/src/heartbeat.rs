// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracks the last time each connection was seen (a pong, a heartbeat
//! message, or any inbound frame) and flags connections past the receive
//! timeout as dead so the cleanup worker can close them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::types::ConnectionId;

pub struct HeartbeatTracker {
    last_seen: RwLock<HashMap<ConnectionId, Instant>>,
    timeout: Duration,
}

impl HeartbeatTracker {
    pub fn new(timeout: Duration) -> Self {
        Self { last_seen: RwLock::new(HashMap::new()), timeout }
    }

    pub async fn touch(&self, conn_id: ConnectionId, at: Instant) {
        self.last_seen.write().await.insert(conn_id, at);
    }

    pub async fn forget(&self, conn_id: ConnectionId) {
        self.last_seen.write().await.remove(&conn_id);
    }

    pub async fn is_expired(&self, conn_id: ConnectionId, now: Instant) -> bool {
        match self.last_seen.read().await.get(&conn_id) {
            Some(seen) => now.duration_since(*seen) > self.timeout,
            None => false,
        }
    }

    /// Returns every connection whose last-seen timestamp is older than the
    /// configured timeout, for the cleanup worker's sweep.
    pub async fn expired(&self, now: Instant) -> Vec<ConnectionId> {
        self.last_seen
            .read()
            .await
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) > self.timeout)
            .map(|(id, _)| *id)
            .collect()
    }

    pub async fn tracked_count(&self) -> usize {
        self.last_seen.read().await.len()
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
