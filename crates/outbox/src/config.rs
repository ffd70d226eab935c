// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;
use gateway_core::constants;

#[derive(Debug, Clone, Parser)]
#[command(name = "outbox-worker", version)]
pub struct OutboxConfig {
    #[arg(long, env = "OUTBOX_DATABASE_URL")]
    pub database_url: String,

    #[arg(long, default_value = "nats://127.0.0.1:4222", env = "OUTBOX_NATS_URL")]
    pub nats_url: String,

    #[arg(long, default_value = "", env = "OUTBOX_NATS_PREFIX")]
    pub nats_subject_prefix: String,

    #[arg(long, default_value_t = 1, env = "OUTBOX_WORKER_COUNT")]
    pub worker_count: u32,

    #[arg(long, default_value_t = constants::OUTBOX_BATCH_SIZE, env = "OUTBOX_BATCH_SIZE")]
    pub batch_size: i64,

    #[arg(long, default_value_t = 1, env = "OUTBOX_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: u64,

    #[arg(long, default_value_t = constants::OUTBOX_MAX_RETRIES, env = "OUTBOX_MAX_RETRIES")]
    pub max_retries: i32,

    #[arg(long, default_value_t = 300, env = "OUTBOX_STALE_PROCESSING_THRESHOLD_SECS")]
    pub stale_processing_threshold_secs: u64,
}

impl OutboxConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn stale_processing_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_processing_threshold_secs)
    }
}
