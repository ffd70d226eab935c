// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sharded per-user/per-branch mutexes plus the four global mutexes, and
//! the [`LockSequence`] guard that enforces the canonical acquisition order
//! across all of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gateway_core::constants::{LOCK_CLEANUP_HYSTERESIS_RATIO, LOCK_CLEANUP_THRESHOLD};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::GatewayError;

/// Canonical lock acquisition order. Lower numbers must be acquired first;
/// acquiring a lower-order lock while holding a higher one is a
/// [`GatewayError::LockOrderViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LockOrder {
    ConnectionCounter = 1,
    User = 2,
    Branch = 3,
    Sector = 4,
    Session = 5,
    DeadConnections = 6,
}

impl LockOrder {
    fn name(self) -> &'static str {
        match self {
            LockOrder::ConnectionCounter => "connection_counter",
            LockOrder::User => "user",
            LockOrder::Branch => "branch",
            LockOrder::Sector => "sector",
            LockOrder::Session => "session",
            LockOrder::DeadConnections => "dead_connections",
        }
    }
}

type Shard = Arc<Mutex<()>>;

/// Owns the sharded per-user/per-branch mutexes and the four global
/// mutexes. Sharded maps are only ever touched through `get_or_create` and
/// `sweep_unheld` — nothing else reaches into the meta-mutex, per the
/// non-reentrancy constraint this type exists to enforce.
pub struct LockManager {
    pub connection_counter_lock: Shard,
    pub sector_lock: Shard,
    pub session_lock: Shard,
    pub dead_connections_lock: Shard,
    branch_locks: Mutex<HashMap<i64, Shard>>,
    user_locks: Mutex<HashMap<i64, Shard>>,
    cleanup_scheduled: AtomicBool,
    cleanup_handle: Mutex<Option<JoinHandle<()>>>,
}

impl LockManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connection_counter_lock: Arc::new(Mutex::new(())),
            sector_lock: Arc::new(Mutex::new(())),
            session_lock: Arc::new(Mutex::new(())),
            dead_connections_lock: Arc::new(Mutex::new(())),
            branch_locks: Mutex::new(HashMap::new()),
            user_locks: Mutex::new(HashMap::new()),
            cleanup_scheduled: AtomicBool::new(false),
            cleanup_handle: Mutex::new(None),
        })
    }

    pub async fn branch_lock(self: &Arc<Self>, branch_id: i64) -> Shard {
        self.get_or_create(&self.branch_locks, branch_id).await
    }

    pub async fn user_lock(self: &Arc<Self>, user_id: i64) -> Shard {
        self.get_or_create(&self.user_locks, user_id).await
    }

    async fn get_or_create(self: &Arc<Self>, map: &Mutex<HashMap<i64, Shard>>, id: i64) -> Shard {
        let mut guard = map.lock().await;
        if let Some(existing) = guard.get(&id) {
            return existing.clone();
        }
        let shard = Arc::new(Mutex::new(()));
        guard.insert(id, shard.clone());
        let over_threshold = guard.len() >= LOCK_CLEANUP_THRESHOLD;
        drop(guard);

        if over_threshold {
            self.schedule_cleanup();
        }
        shard
    }

    /// Schedules a cleanup sweep if one isn't already outstanding. At most
    /// one cleanup task runs at a time.
    fn schedule_cleanup(self: &Arc<Self>) {
        if self
            .cleanup_scheduled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let this = self.clone();
        let handle = tokio::spawn(async move {
            this.sweep_unheld().await;
            this.cleanup_scheduled.store(false, Ordering::SeqCst);
        });
        if let Ok(mut slot) = self.cleanup_handle.try_lock() {
            *slot = Some(handle);
        }
    }

    /// Removes unheld shards (no outstanding `Arc` clone besides the map's
    /// own) down to the hysteresis target, for both branch and user maps.
    /// Never calls back into `get_or_create` / `branch_lock` / `user_lock`.
    async fn sweep_unheld(&self) {
        Self::cleanup_one(&self.branch_locks).await;
        Self::cleanup_one(&self.user_locks).await;
    }

    async fn cleanup_one(map: &Mutex<HashMap<i64, Shard>>) {
        let mut guard = map.lock().await;
        if guard.len() < LOCK_CLEANUP_THRESHOLD {
            return;
        }
        let target = (LOCK_CLEANUP_THRESHOLD as f64 * LOCK_CLEANUP_HYSTERESIS_RATIO) as usize;
        let mut unheld: Vec<i64> = guard
            .iter()
            .filter(|(_, shard)| Arc::strong_count(shard) == 1)
            .map(|(id, _)| *id)
            .collect();
        unheld.sort_unstable();
        for id in unheld {
            if guard.len() <= target {
                break;
            }
            guard.remove(&id);
        }
        debug!(remaining = guard.len(), "lock shard sweep complete");
    }

    /// Awaits any outstanding cleanup before teardown, bounded so shutdown
    /// never hangs on it.
    pub async fn shutdown(&self, timeout: Duration) {
        let handle = self.cleanup_handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(timeout, handle).await;
        }
    }

    pub async fn branch_shard_count(&self) -> usize {
        self.branch_locks.lock().await.len()
    }

    pub async fn user_shard_count(&self) -> usize {
        self.user_locks.lock().await.len()
    }
}

/// Context manager enforcing the canonical lock order. Acquired locks are
/// released in reverse order on drop.
pub struct LockSequence {
    manager: Arc<LockManager>,
    strict: bool,
    current_max: Option<LockOrder>,
    held: Vec<(LockOrder, OwnedMutexGuard<()>, String)>,
}

impl LockSequence {
    pub fn new(manager: Arc<LockManager>) -> Self {
        Self { manager, strict: true, current_max: None, held: Vec::new() }
    }

    /// Non-strict mode logs order violations instead of failing; reserved
    /// for tests that intentionally probe ordering.
    pub fn non_strict(manager: Arc<LockManager>) -> Self {
        Self { manager, strict: false, current_max: None, held: Vec::new() }
    }

    fn check_order(&self, order: LockOrder) -> Result<(), GatewayError> {
        if let Some(max) = self.current_max {
            if order < max {
                if self.strict {
                    return Err(GatewayError::LockOrderViolation {
                        attempted: order.name(),
                        held: max.name(),
                    });
                }
                tracing::warn!(attempted = order.name(), held = max.name(), "lock order violation (non-strict)");
            }
        }
        Ok(())
    }

    async fn acquire(&mut self, order: LockOrder, shard: Shard, name: String) -> Result<(), GatewayError> {
        self.check_order(order)?;
        let guard = shard.lock_owned().await;
        self.held.push((order, guard, name));
        if self.current_max.map(|m| order > m).unwrap_or(true) {
            self.current_max = Some(order);
        }
        Ok(())
    }

    pub async fn acquire_connection_counter(&mut self) -> Result<(), GatewayError> {
        let shard = self.manager.connection_counter_lock.clone();
        self.acquire(LockOrder::ConnectionCounter, shard, "connection_counter".into()).await
    }

    pub async fn acquire_user(&mut self, user_id: i64) -> Result<(), GatewayError> {
        let shard = self.manager.user_lock(user_id).await;
        self.acquire(LockOrder::User, shard, format!("user:{user_id}")).await
    }

    pub async fn acquire_users(&mut self, user_ids: &[i64]) -> Result<(), GatewayError> {
        let mut sorted = user_ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for id in sorted {
            self.acquire_user(id).await?;
        }
        Ok(())
    }

    pub async fn acquire_branch(&mut self, branch_id: i64) -> Result<(), GatewayError> {
        let shard = self.manager.branch_lock(branch_id).await;
        self.acquire(LockOrder::Branch, shard, format!("branch:{branch_id}")).await
    }

    pub async fn acquire_branches(&mut self, branch_ids: &[i64]) -> Result<(), GatewayError> {
        let mut sorted = branch_ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for id in sorted {
            self.acquire_branch(id).await?;
        }
        Ok(())
    }

    pub async fn acquire_sector(&mut self) -> Result<(), GatewayError> {
        let shard = self.manager.sector_lock.clone();
        self.acquire(LockOrder::Sector, shard, "sector".into()).await
    }

    pub async fn acquire_session(&mut self) -> Result<(), GatewayError> {
        let shard = self.manager.session_lock.clone();
        self.acquire(LockOrder::Session, shard, "session".into()).await
    }

    pub async fn acquire_dead_connections(&mut self) -> Result<(), GatewayError> {
        let shard = self.manager.dead_connections_lock.clone();
        self.acquire(LockOrder::DeadConnections, shard, "dead_connections".into()).await
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    pub fn current_order(&self) -> Option<LockOrder> {
        self.current_max
    }
}

impl Drop for LockSequence {
    fn drop(&mut self) {
        for (order, guard, name) in self.held.drain(..).rev() {
            debug!(%name, order = order.name(), "releasing lock");
            drop(guard);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "locks_tests.rs"]
mod tests;
