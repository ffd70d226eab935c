// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root. One [`GatewayState`] is built at startup and shared
//! (via `Arc`) across every axum handler and background worker.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::auth::Authenticator;
use crate::broadcaster::Broadcaster;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::GatewayConfig;
use crate::drop_tracker::DropTracker;
use crate::heartbeat::HeartbeatTracker;
use crate::index::ConnectionIndex;
use crate::locks::LockManager;
use crate::metrics::Metrics;
use crate::rate_limiter::RateLimiter;
use crate::router::EventRouter;
use crate::sectors::SectorRepository;
use crate::types::ConnectionId;

pub struct GatewayState {
    pub config: GatewayConfig,
    pub authenticator: Authenticator,
    pub lock_manager: Arc<LockManager>,
    pub index: Arc<ConnectionIndex>,
    pub heartbeats: Arc<HeartbeatTracker>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    pub router: Arc<EventRouter>,
    pub broadcaster: Broadcaster,
    pub drop_tracker: Arc<DropTracker>,
    pub bus_circuit: Arc<CircuitBreaker>,
    pub metrics: Arc<Metrics>,
    pub shutdown: CancellationToken,
    /// `None` when no database is configured — waiters then see an empty
    /// sector assignment on every lookup instead of the gateway failing to
    /// start.
    pub sector_repository: Option<Arc<SectorRepository>>,
    senders: RwLock<HashMap<ConnectionId, mpsc::Sender<Arc<Value>>>>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Arc<Self> {
        let lock_manager = LockManager::new();
        let index = Arc::new(ConnectionIndex::new());
        let heartbeats = Arc::new(HeartbeatTracker::new(config.heartbeat_timeout()));
        let rate_limiter = Arc::new(Mutex::new(RateLimiter::new(config.message_rate_limit, config.message_rate_window())));
        let router = Arc::new(EventRouter::new());
        let drop_tracker = Arc::new(DropTracker::new());
        let broadcaster = Broadcaster::new(index.clone(), router.clone(), drop_tracker.clone(), config.broadcast_batch_size);
        let bus_circuit = Arc::new(CircuitBreaker::new("nats-bus"));
        let authenticator = Authenticator::from_config(&config);
        // `connect_lazy` defers the actual connection so this constructor
        // can stay synchronous; the pool dials out on first query.
        let sector_repository = config.database_url.as_ref().map(|url| {
            let pool = PgPoolOptions::new()
                .connect_lazy(url)
                .expect("database url must be a valid postgres connection string");
            Arc::new(SectorRepository::new(pool))
        });

        Arc::new(Self {
            config,
            authenticator,
            lock_manager,
            index,
            heartbeats,
            rate_limiter,
            router,
            broadcaster,
            drop_tracker,
            bus_circuit,
            metrics: Arc::new(Metrics::new()),
            shutdown: CancellationToken::new(),
            sector_repository,
            senders: RwLock::new(HashMap::new()),
        })
    }

    pub async fn register_sender(&self, conn_id: ConnectionId, sender: mpsc::Sender<Arc<Value>>) {
        self.senders.write().await.insert(conn_id, sender);
        self.metrics.connections_active.fetch_add(1, Ordering::Relaxed);
        self.metrics.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn remove_sender(&self, conn_id: ConnectionId) {
        if self.senders.write().await.remove(&conn_id).is_some() {
            self.metrics.connections_active.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub async fn sender_for(&self, conn_id: ConnectionId) -> Option<mpsc::Sender<Arc<Value>>> {
        self.senders.read().await.get(&conn_id).cloned()
    }

    /// Cheap snapshot of the sender map for a single broadcast pass. Clones
    /// `mpsc::Sender` handles (an `Arc` bump each), not the channels
    /// themselves, so this is safe to take on every routed event.
    pub async fn sender_snapshot(&self) -> HashMap<ConnectionId, mpsc::Sender<Arc<Value>>> {
        self.senders.read().await.clone()
    }

    pub async fn total_connections(&self) -> usize {
        self.senders.read().await.len()
    }
}
