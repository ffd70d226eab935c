// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunable defaults. Runtime configuration (see `gateway::config`) can
//! override most of these; the values here are what ship when a flag and
//! its `env` fallback are both absent.

use std::time::Duration;

/// Receive timeout must exceed 3x the heartbeat interval so network jitter
/// doesn't read as a dead connection.
pub const WS_RECEIVE_TIMEOUT: Duration = Duration::from_secs(90);

/// How often a JWT-authenticated connection re-checks its token.
pub const JWT_REVALIDATION_INTERVAL: Duration = Duration::from_secs(300);

/// Sector-assignment lookups fall back to an empty list past this timeout.
pub const DB_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Bound on the WebSocket handshake itself.
pub const WS_ACCEPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Cap on cached per-user/per-branch lock shards before cleanup is scheduled.
pub const MAX_CACHED_LOCKS: usize = 500;

/// Cleanup triggers once the shard count reaches this.
pub const LOCK_CLEANUP_THRESHOLD: usize = 400;

/// Cleanup reduces the shard count to this fraction of the threshold.
pub const LOCK_CLEANUP_HYSTERESIS_RATIO: f64 = 0.8;

/// Cap on rate-limiter entries before eviction kicks in.
pub const MAX_TRACKED_CONNECTIONS: usize = 2000;

/// Fraction of tracked entries evicted once the rate limiter is full.
pub const EVICTION_PERCENTAGE: usize = 10;

/// Log every Nth dropped event rather than every one.
pub const DROP_LOG_INTERVAL: u64 = 100;

/// More unknown fields than this on one event smells like a schema mismatch
/// or a crafted payload.
pub const MAX_UNKNOWN_FIELDS: usize = 10;

/// Waiters assigned more sectors than this are logged as suspicious.
pub const MAX_SECTORS_PER_WAITER: usize = 10;

/// Cap on distinct unknown event types tracked at once.
pub const MAX_UNKNOWN_EVENT_TYPES: usize = 100;

pub const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
pub const CIRCUIT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const CIRCUIT_HALF_OPEN_MAX_CALLS: u32 = 3;

pub const HEARTBEAT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// Lock-shard sweep runs every Nth heartbeat cleanup cycle.
pub const LOCK_CLEANUP_CYCLE: u64 = 5;

pub const MAX_BROADCASTS_PER_SECOND: usize = 10;

/// Dead-connection set is evicted FIFO once it reaches this size.
pub const MAX_DEAD_CONNECTIONS: usize = 500;

/// Rate limiter: messages allowed per window.
pub const MESSAGE_RATE_LIMIT: u32 = 20;
pub const MESSAGE_RATE_WINDOW: Duration = Duration::from_secs(1);

/// How long an evicted rate-limiter penalty survives before expiring.
pub const EVICTION_PENALTY_TTL: Duration = Duration::from_secs(3600);

pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

pub const EVENT_QUEUE_SIZE: usize = 10_000;
pub const EVENT_BATCH_SIZE: usize = 256;
pub const EVENT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

pub const BROADCAST_BATCH_SIZE: usize = 50;

pub const MAX_CONNECTIONS_PER_USER: usize = 20;
pub const MAX_TOTAL_CONNECTIONS: usize = 20_000;

pub const OUTBOX_MAX_RETRIES: i32 = 5;
pub const OUTBOX_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const OUTBOX_BATCH_SIZE: i64 = 50;
pub const OUTBOX_STALE_PROCESSING_THRESHOLD: Duration = Duration::from_secs(300);

pub const RECONNECT_MAX_ATTEMPTS: u32 = 20;
pub const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Heartbeat message variants a client may send in place of the JSON ping.
pub const MSG_PING_PLAIN: &str = "ping";
pub const MSG_PING_JSON: &str = r#"{"type":"ping"}"#;
pub const MSG_PONG_JSON: &str = r#"{"type":"pong"}"#;
pub const MSG_REFRESH_SECTORS: &str = "refresh_sectors";
