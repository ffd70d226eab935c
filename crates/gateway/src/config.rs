// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;
use gateway_core::constants;

/// Runtime configuration for the realtime gateway process.
///
/// Every tunable from the external-interfaces configuration table is a flag
/// here, with an `env` fallback so containerized deployments can configure
/// without touching the command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "gateway", version)]
pub struct GatewayConfig {
    #[arg(long, default_value = "0.0.0.0", env = "GATEWAY_HOST")]
    pub host: String,

    #[arg(long, default_value_t = 8080, env = "GATEWAY_PORT")]
    pub port: u16,

    #[arg(long, default_value = "nats://127.0.0.1:4222", env = "GATEWAY_NATS_URL")]
    pub nats_url: String,

    #[arg(long, default_value = "", env = "GATEWAY_NATS_PREFIX")]
    pub nats_subject_prefix: String,

    /// HMAC secret used to verify incoming JWTs for waiter/kitchen/admin.
    #[arg(long, env = "GATEWAY_JWT_SECRET")]
    pub jwt_secret: String,

    /// HMAC secret used to verify table tokens for diners.
    #[arg(long, env = "GATEWAY_TABLE_TOKEN_SECRET")]
    pub table_token_secret: String,

    /// Database used for waiter sector-assignment lookups. Sector
    /// assignment refresh is skipped (empty list) when unset.
    #[arg(long, env = "GATEWAY_DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        default_value = "http://localhost:3000",
        env = "GATEWAY_ALLOWED_ORIGINS"
    )]
    pub allowed_origins: Vec<String>,

    #[arg(long, default_value_t = 60, env = "GATEWAY_HEARTBEAT_TIMEOUT_SECS")]
    pub heartbeat_timeout_secs: u64,

    #[arg(long, default_value_t = 90, env = "GATEWAY_RECEIVE_TIMEOUT_SECS")]
    pub receive_timeout_secs: u64,

    #[arg(long, default_value_t = 300, env = "GATEWAY_JWT_REVALIDATION_INTERVAL_SECS")]
    pub jwt_revalidation_interval_secs: u64,

    #[arg(long, default_value_t = constants::MAX_CONNECTIONS_PER_USER, env = "GATEWAY_MAX_CONNECTIONS_PER_USER")]
    pub max_connections_per_user: usize,

    #[arg(long, default_value_t = constants::MAX_TOTAL_CONNECTIONS, env = "GATEWAY_MAX_TOTAL_CONNECTIONS")]
    pub max_total_connections: usize,

    #[arg(long, default_value_t = constants::BROADCAST_BATCH_SIZE, env = "GATEWAY_BROADCAST_BATCH_SIZE")]
    pub broadcast_batch_size: usize,

    #[arg(long, default_value_t = constants::MESSAGE_RATE_LIMIT, env = "GATEWAY_MESSAGE_RATE_LIMIT")]
    pub message_rate_limit: u32,

    #[arg(long, default_value_t = 1, env = "GATEWAY_MESSAGE_RATE_WINDOW_SECS")]
    pub message_rate_window_secs: u64,

    #[arg(long, default_value_t = constants::MAX_MESSAGE_SIZE, env = "GATEWAY_MAX_MESSAGE_SIZE")]
    pub max_message_size: usize,

    #[arg(long, default_value_t = constants::EVENT_QUEUE_SIZE, env = "GATEWAY_EVENT_QUEUE_SIZE")]
    pub event_queue_size: usize,

    #[arg(long, default_value_t = constants::EVENT_BATCH_SIZE, env = "GATEWAY_EVENT_BATCH_SIZE")]
    pub event_batch_size: usize,

    #[arg(long, default_value_t = 5, env = "GATEWAY_EVENT_CALLBACK_TIMEOUT_SECS")]
    pub event_callback_timeout_secs: u64,

    #[arg(long, default_value_t = constants::MAX_BROADCASTS_PER_SECOND, env = "GATEWAY_MAX_BROADCASTS_PER_SECOND")]
    pub max_broadcasts_per_second: usize,

    #[arg(long, default_value_t = constants::MAX_SECTORS_PER_WAITER, env = "GATEWAY_MAX_SECTORS_PER_WAITER")]
    pub max_sectors_per_waiter: usize,

    #[arg(long, default_value_t = constants::RECONNECT_MAX_ATTEMPTS, env = "GATEWAY_RECONNECT_MAX_ATTEMPTS")]
    pub reconnect_max_attempts: u32,

    #[arg(long, default_value_t = 60, env = "GATEWAY_RECONNECT_MAX_DELAY_SECS")]
    pub reconnect_max_delay_secs: u64,
}

impl GatewayConfig {
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }

    pub fn jwt_revalidation_interval(&self) -> Duration {
        Duration::from_secs(self.jwt_revalidation_interval_secs)
    }

    pub fn message_rate_window(&self) -> Duration {
        Duration::from_secs(self.message_rate_window_secs)
    }

    pub fn event_callback_timeout(&self) -> Duration {
        Duration::from_secs(self.event_callback_timeout_secs)
    }

    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_max_delay_secs)
    }
}
