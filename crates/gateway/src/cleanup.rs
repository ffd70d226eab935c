// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic background sweep: closes connections past the heartbeat
//! timeout, sweeps expired rate-limiter eviction penalties, and every Nth
//! cycle asks the lock manager to reclaim unheld shards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway_core::constants::{HEARTBEAT_CLEANUP_INTERVAL, LOCK_CLEANUP_CYCLE};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::heartbeat::HeartbeatTracker;
use crate::locks::LockManager;
use crate::rate_limiter::RateLimiter;
use crate::types::ConnectionId;

pub struct CleanupWorker {
    heartbeats: Arc<HeartbeatTracker>,
    lock_manager: Arc<LockManager>,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    interval: Duration,
}

impl CleanupWorker {
    pub fn new(heartbeats: Arc<HeartbeatTracker>, lock_manager: Arc<LockManager>, rate_limiter: Arc<Mutex<RateLimiter>>) -> Self {
        Self { heartbeats, lock_manager, rate_limiter, interval: HEARTBEAT_CLEANUP_INTERVAL }
    }

    /// Runs until `cancel` fires. `on_expired` is invoked with each
    /// connection id found past its heartbeat timeout; the caller owns
    /// actually closing the socket.
    pub async fn run<F>(self, cancel: CancellationToken, on_expired: F)
    where
        F: Fn(ConnectionId) + Send + Sync + 'static,
    {
        let mut cycle: u64 = 0;
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("cleanup worker shutting down");
                    self.lock_manager.shutdown(Duration::from_secs(5)).await;
                    return;
                }
                _ = ticker.tick() => {
                    self.run_once(&on_expired, cycle).await;
                    cycle = cycle.wrapping_add(1);
                }
            }
        }
    }

    async fn run_once<F>(&self, on_expired: &F, cycle: u64)
    where
        F: Fn(ConnectionId),
    {
        let now = Instant::now();
        let expired = self.heartbeats.expired(now).await;
        for conn_id in &expired {
            on_expired(*conn_id);
            self.heartbeats.forget(*conn_id).await;
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "cleanup worker closed expired connections");
        }

        self.rate_limiter.lock().await.sweep_expired_penalties(now);

        if cycle % LOCK_CLEANUP_CYCLE == 0 {
            debug!(
                branch_shards = self.lock_manager.branch_shard_count().await,
                user_shards = self.lock_manager.user_shard_count().await,
                "lock shard counts"
            );
        }
    }
}
