// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Writes an outbox row inside the caller's own business transaction. This
//! module never commits — the caller's transaction either commits both the
//! business write and the outbox row together, or neither happens, which is
//! the entire point of the pattern.

use serde_json::Value;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::OutboxError;

/// Inserts a pending outbox row. `event_type` is the wire event name;
/// `aggregate_type`/`aggregate_id` identify the domain entity the event is
/// about and are what the processor routes publication by — together with
/// `event_type` they form the idempotency key for this write. `payload`
/// must already be the exact JSON body subscribers expect.
pub async fn write_outbox_event(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: i64,
    event_type: &str,
    aggregate_type: &str,
    aggregate_id: i64,
    payload: &Value,
    max_retries: i32,
) -> Result<Uuid, OutboxError> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO outbox_events
            (id, tenant_id, event_type, aggregate_type, aggregate_id, payload, status, retry_count, max_retries, created_at, updated_at, next_attempt_at)
        VALUES
            ($1, $2, $3, $4, $5, $6, 'PENDING', 0, $7, now(), now(), now())
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .bind(event_type)
    .bind(aggregate_type)
    .bind(aggregate_id)
    .bind(payload)
    .bind(max_retries)
    .execute(&mut **tx)
    .await?;
    Ok(id)
}

/// Billing family: `CHECK_*` / `PAYMENT_*`. Defaults `actor_role` to
/// `"system"` when the caller doesn't supply one, matching the behavior of
/// payment-gateway-initiated events that have no human actor.
#[allow(clippy::too_many_arguments)]
pub async fn write_billing_outbox_event(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: i64,
    branch_id: i64,
    session_id: i64,
    check_id: i64,
    event_type: &str,
    mut entity: Value,
    actor_role: Option<&str>,
    max_retries: i32,
) -> Result<Uuid, OutboxError> {
    if let Some(obj) = entity.as_object_mut() {
        obj.entry("actor_role").or_insert_with(|| Value::String(actor_role.unwrap_or("system").to_string()));
    }
    let payload = serde_json::json!({
        "type": event_type,
        "tenant_id": tenant_id,
        "branch_id": branch_id,
        "session_id": session_id,
        "entity": entity,
    });
    write_outbox_event(tx, tenant_id, event_type, "check", check_id, &payload, max_retries).await
}

/// Round family: `ROUND_*`. Routed by sector when the entity carries one,
/// otherwise by branch.
#[allow(clippy::too_many_arguments)]
pub async fn write_round_outbox_event(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: i64,
    branch_id: i64,
    sector_id: Option<i64>,
    round_id: i64,
    event_type: &str,
    entity: Value,
    actor_role: &str,
    max_retries: i32,
) -> Result<Uuid, OutboxError> {
    let payload = serde_json::json!({
        "type": event_type,
        "tenant_id": tenant_id,
        "branch_id": branch_id,
        "sector_id": sector_id,
        "entity": entity,
        "actor": { "role": actor_role },
    });
    write_outbox_event(tx, tenant_id, event_type, "round", round_id, &payload, max_retries).await
}

/// Service-call family: `SERVICE_CALL_*`. Always branch- or sector-scoped,
/// never session-scoped — a service call has no table session once closed.
#[allow(clippy::too_many_arguments)]
pub async fn write_service_call_outbox_event(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: i64,
    branch_id: i64,
    sector_id: Option<i64>,
    call_id: i64,
    event_type: &str,
    entity: Value,
    max_retries: i32,
) -> Result<Uuid, OutboxError> {
    let payload = serde_json::json!({
        "type": event_type,
        "tenant_id": tenant_id,
        "branch_id": branch_id,
        "sector_id": sector_id,
        "entity": entity,
        "actor": { "role": "waiter" },
    });
    write_outbox_event(tx, tenant_id, event_type, "service_call", call_id, &payload, max_retries).await
}
