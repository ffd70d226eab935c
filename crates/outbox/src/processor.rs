// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polls `outbox_events` for pending rows, publishes each to the bus, and
//! marks the outcome. Claiming uses `SELECT ... FOR UPDATE SKIP LOCKED` so
//! multiple worker processes can run the same poll loop concurrently
//! without double-publishing a row.

use std::time::Duration;

use async_nats::Client;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::OutboxConfig;
use crate::error::OutboxError;
use crate::row::{OutboxRow, OutboxStatus};

pub struct OutboxProcessor {
    pool: PgPool,
    bus: Client,
    batch_size: i64,
    poll_interval: Duration,
    max_retries: i32,
    stale_processing_threshold: Duration,
    nats_subject_prefix: String,
}

impl OutboxProcessor {
    pub fn new(pool: PgPool, bus: Client, config: &OutboxConfig) -> Self {
        Self {
            pool,
            bus,
            batch_size: config.batch_size,
            poll_interval: config.poll_interval(),
            max_retries: config.max_retries,
            stale_processing_threshold: config.stale_processing_threshold(),
            nats_subject_prefix: config.nats_subject_prefix.clone(),
        }
    }

    /// Resets rows stuck in `PROCESSING` from a crashed prior run back to
    /// `PENDING`. Must run once at startup before the poll loop begins, or
    /// a worker that died mid-batch leaks rows nobody will ever retry.
    pub async fn recover_stale_processing(&self) -> Result<u64, OutboxError> {
        let threshold = Utc::now() - chrono::Duration::from_std(self.stale_processing_threshold).unwrap_or_default();
        let result = sqlx::query(
            r#"
            UPDATE outbox_events
            SET status = 'PENDING', updated_at = now()
            WHERE status = 'PROCESSING' AND updated_at < $1
            "#,
        )
        .bind(threshold)
        .execute(&self.pool)
        .await?;
        let count = result.rows_affected();
        if count > 0 {
            warn!(count, "recovered stale PROCESSING outbox rows at startup");
        }
        Ok(count)
    }

    pub async fn run(self, cancel: CancellationToken) {
        if let Err(err) = self.recover_stale_processing().await {
            error!(err = %err, "failed to recover stale outbox rows");
        }

        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("outbox processor shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    match self.poll_and_publish().await {
                        Ok(published) if published > 0 => debug!(published, "outbox batch processed"),
                        Ok(_) => {}
                        Err(err) => error!(err = %err, "outbox poll failed"),
                    }
                }
            }
        }
    }

    async fn poll_and_publish(&self) -> Result<usize, OutboxError> {
        let mut tx = self.pool.begin().await?;
        let rows: Vec<OutboxRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, event_type, aggregate_type, aggregate_id, payload, status,
                   retry_count, max_retries, last_error, created_at, updated_at, processed_at, next_attempt_at
            FROM outbox_events
            WHERE status = 'PENDING' AND next_attempt_at <= now()
            ORDER BY created_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(self.batch_size)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            tx.commit().await?;
            return Ok(0);
        }

        for row in &rows {
            sqlx::query("UPDATE outbox_events SET status = 'PROCESSING', updated_at = now() WHERE id = $1")
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        let mut published = 0;
        for row in rows {
            match self.publish_event(&row).await {
                Ok(()) => {
                    self.mark_published(row.id).await?;
                    published += 1;
                }
                Err(err) => {
                    warn!(id = %row.id, aggregate_type = %row.aggregate_type, aggregate_id = row.aggregate_id, err = %err, "failed to publish outbox event");
                    self.mark_retry(&row).await?;
                }
            }
        }
        Ok(published)
    }

    /// Routes a row to its bus subject by `aggregate_type`, then publishes.
    /// An unrecognized aggregate type is a publish failure, not a panic —
    /// it's retried and eventually marked FAILED like any other bad row.
    async fn publish_event(&self, row: &OutboxRow) -> Result<(), OutboxError> {
        let subject = match row.aggregate_type.as_str() {
            "round" | "service_call" => self.waiter_subject(&row.payload),
            "check" => self.session_subject(&row.payload),
            other => return Err(OutboxError::UnknownAggregateType(other.to_string())),
        };
        let bytes = serde_json::to_vec(&row.payload)?;
        self.bus.publish(subject, bytes.into()).await?;
        Ok(())
    }

    fn prefixed(&self, suffix: &str) -> String {
        if self.nats_subject_prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}.{}", self.nats_subject_prefix, suffix)
        }
    }

    /// Sector-scoped when the payload carries a `sector_id`, branch-wide
    /// otherwise — the same fallback waiters themselves are routed by.
    fn waiter_subject(&self, payload: &serde_json::Value) -> String {
        let suffix = match payload.get("sector_id").and_then(|v| v.as_i64()) {
            Some(sector_id) => format!("sector.{sector_id}.waiters"),
            None => {
                let branch_id = payload.get("branch_id").and_then(|v| v.as_i64()).unwrap_or_default();
                format!("branch.{branch_id}.waiters")
            }
        };
        self.prefixed(&suffix)
    }

    fn session_subject(&self, payload: &serde_json::Value) -> String {
        let session_id = payload.get("session_id").and_then(|v| v.as_i64()).unwrap_or_default();
        self.prefixed(&format!("session.{session_id}"))
    }

    async fn mark_published(&self, id: uuid::Uuid) -> Result<(), OutboxError> {
        sqlx::query("UPDATE outbox_events SET status = 'PUBLISHED', processed_at = now(), updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_retry(&self, row: &OutboxRow) -> Result<(), OutboxError> {
        let retry_count = row.retry_count + 1;
        if retry_count > row.max_retries.max(self.max_retries) {
            sqlx::query(
                "UPDATE outbox_events SET status = 'FAILED', retry_count = $2, last_error = $3, updated_at = now() WHERE id = $1",
            )
            .bind(row.id)
            .bind(retry_count)
            .bind("exceeded max retries")
            .execute(&self.pool)
            .await?;
            error!(id = %row.id, aggregate_type = %row.aggregate_type, aggregate_id = row.aggregate_id, "outbox event exhausted retries, marked FAILED");
            return Ok(());
        }

        let delay = calculate_backoff(retry_count);
        let next_attempt = Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default();
        sqlx::query(
            r#"
            UPDATE outbox_events
            SET status = 'PENDING', retry_count = $2, next_attempt_at = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(retry_count)
        .bind(next_attempt)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

}

/// `min_backoff * 2^retry_count`, capped at `max_backoff`.
fn calculate_backoff(retry_count: i32) -> Duration {
    let min_backoff = gateway_core::constants::RECONNECT_BASE_DELAY.as_secs_f64();
    let max_backoff = gateway_core::constants::RECONNECT_MAX_DELAY.as_secs_f64();
    let computed = min_backoff * 2f64.powi(retry_count);
    Duration::from_secs_f64(computed.min(max_backoff))
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
