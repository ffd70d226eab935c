// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenario checks against the gateway's public API: no process
//! spawning, no live NATS, no open sockets. Each test builds a
//! [`GatewayState`] directly, registers connections the way the accept loop
//! would, and drives an event through the same router/broadcaster path a
//! live bus message would take.

use std::sync::Arc;

use gateway::config::GatewayConfig;
use gateway::state::GatewayState;
use gateway::types::ConnectionId;
use gateway_specs::{admin, diner, event, kitchen, waiter};
use serde_json::json;
use tokio::sync::mpsc;

fn test_config() -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".into(),
        port: 0,
        nats_url: "nats://127.0.0.1:4222".into(),
        nats_subject_prefix: String::new(),
        jwt_secret: "test-jwt-secret".into(),
        table_token_secret: "test-table-secret".into(),
        database_url: None,
        allowed_origins: vec!["http://localhost:3000".into()],
        heartbeat_timeout_secs: 60,
        receive_timeout_secs: 90,
        jwt_revalidation_interval_secs: 300,
        max_connections_per_user: 20,
        max_total_connections: 20_000,
        broadcast_batch_size: 50,
        message_rate_limit: 20,
        message_rate_window_secs: 1,
        max_message_size: 64 * 1024,
        event_queue_size: 10_000,
        event_batch_size: 256,
        event_callback_timeout_secs: 5,
        max_broadcasts_per_second: 10,
        max_sectors_per_waiter: 10,
        reconnect_max_attempts: 20,
        reconnect_max_delay_secs: 60,
    }
}

/// Registers a connection with its own outbound channel and returns the
/// receiving half so the test can assert on what it was sent.
async fn connect(state: &Arc<GatewayState>, identity: gateway::types::Identity) -> (ConnectionId, mpsc::Receiver<Arc<serde_json::Value>>) {
    let conn_id = ConnectionId::new_v4();
    let (tx, rx) = mpsc::channel(16);
    state.index.register(conn_id, identity).await;
    state.register_sender(conn_id, tx).await;
    (conn_id, rx)
}

/// A round submitted by a diner reaches admin and waiters scoped to its
/// sector, but never reaches the kitchen — kitchen only sees it once it's
/// moved into preparation.
#[tokio::test]
async fn round_submitted_reaches_waiters_and_admin_not_kitchen() {
    let state = GatewayState::new(test_config());
    let (_, mut waiter_rx) = connect(&state, waiter(1, 10, vec![3])).await;
    let (_, mut kitchen_rx) = connect(&state, kitchen(1, 10)).await;
    let (_, mut admin_rx) = connect(&state, admin(1, 10)).await;

    let submitted = event(json!({
        "type": "ROUND_SUBMITTED",
        "tenant_id": 1,
        "branch_id": 10,
        "sector_id": 3,
    }));

    let senders = state.sender_snapshot().await;
    state.broadcaster.broadcast(&submitted, &senders).await;

    assert!(waiter_rx.try_recv().is_ok());
    assert!(admin_rx.try_recv().is_ok());
    assert!(kitchen_rx.try_recv().is_err());
}

/// Once a round moves into the kitchen, every role (waiter, kitchen, admin)
/// and the originating diner session all get the update.
#[tokio::test]
async fn round_in_kitchen_reaches_every_role_and_the_session() {
    let state = GatewayState::new(test_config());
    let (_, mut waiter_rx) = connect(&state, waiter(1, 10, vec![3])).await;
    let (_, mut kitchen_rx) = connect(&state, kitchen(1, 10)).await;
    let (_, mut admin_rx) = connect(&state, admin(1, 10)).await;
    let (_, mut diner_rx) = connect(&state, diner(1, 10, 77)).await;

    let in_kitchen = event(json!({
        "type": "ROUND_IN_KITCHEN",
        "tenant_id": 1,
        "branch_id": 10,
        "sector_id": 3,
        "session_id": 77,
    }));

    let senders = state.sender_snapshot().await;
    state.broadcaster.broadcast(&in_kitchen, &senders).await;

    assert!(waiter_rx.try_recv().is_ok());
    assert!(kitchen_rx.try_recv().is_ok());
    assert!(admin_rx.try_recv().is_ok());
    assert!(diner_rx.try_recv().is_ok());
}

/// A connection belonging to a different tenant never receives a broadcast,
/// even when its branch id happens to collide with the target tenant's.
#[tokio::test]
async fn tenant_isolation_holds_even_with_colliding_branch_ids() {
    let state = GatewayState::new(test_config());
    let (_, mut tenant_one) = connect(&state, waiter(1, 10, vec![])).await;
    let (_, mut tenant_two) = connect(&state, waiter(2, 10, vec![])).await;

    let ready = event(json!({
        "type": "ROUND_READY",
        "tenant_id": 1,
        "branch_id": 10,
    }));

    let senders = state.sender_snapshot().await;
    state.broadcaster.broadcast(&ready, &senders).await;

    assert!(tenant_one.try_recv().is_ok());
    assert!(tenant_two.try_recv().is_err());
}

/// Ticket lifecycle events are kitchen-only — neither waiters nor admin are
/// disturbed by the kitchen's internal prep states.
#[tokio::test]
async fn ticket_events_stay_in_the_kitchen() {
    let state = GatewayState::new(test_config());
    let (_, mut waiter_rx) = connect(&state, waiter(1, 10, vec![])).await;
    let (_, mut kitchen_rx) = connect(&state, kitchen(1, 10)).await;
    let (_, mut admin_rx) = connect(&state, admin(1, 10)).await;

    let ticket = event(json!({"type": "TICKET_READY", "tenant_id": 1, "branch_id": 10}));

    let senders = state.sender_snapshot().await;
    state.broadcaster.broadcast(&ticket, &senders).await;

    assert!(kitchen_rx.try_recv().is_ok());
    assert!(waiter_rx.try_recv().is_err());
    assert!(admin_rx.try_recv().is_err());
}

/// Disconnecting unregisters a connection from every index it was placed
/// in, so a later broadcast to its old sector finds nobody there.
#[tokio::test]
async fn disconnect_removes_the_connection_from_routing() {
    let state = GatewayState::new(test_config());
    let (conn_id, mut rx) = connect(&state, waiter(1, 10, vec![3])).await;

    state.index.unregister(conn_id).await;
    state.remove_sender(conn_id).await;

    let submitted = event(json!({"type": "ROUND_SUBMITTED", "tenant_id": 1, "branch_id": 10, "sector_id": 3}));
    let senders = state.sender_snapshot().await;
    state.broadcaster.broadcast(&submitted, &senders).await;

    assert!(rx.try_recv().is_err());
}

/// An unrecognized table token is rejected outright rather than falling
/// through to some default identity.
#[test]
fn malformed_table_token_is_rejected() {
    let config = test_config();
    let authenticator = gateway::auth::Authenticator::from_config(&config);
    assert!(authenticator.table_token.authenticate("table_token=not-a-real-token").is_err());
}

/// A connection presenting neither a `jwt` nor a `table_token` credential
/// matches neither strategy, rather than falling through to some default
/// identity.
#[test]
fn missing_credential_matches_no_strategy() {
    let config = test_config();
    let authenticator = gateway::auth::Authenticator::from_config(&config);
    assert!(authenticator.jwt.authenticate("").unwrap().is_none());
    assert!(authenticator.table_token.authenticate("").unwrap().is_none());
}

/// A JWT whose role claim is outside the known set is rejected rather than
/// silently treated as some default role.
#[test]
fn jwt_with_unrecognized_role_is_rejected() -> anyhow::Result<()> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    let config = test_config();
    let claims = json!({"sub": 1, "role": "busboy", "tenant_id": 1});
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(config.jwt_secret.as_bytes()))?;

    let authenticator = gateway::auth::Authenticator::from_config(&config);
    assert!(authenticator.jwt.authenticate(&format!("jwt={token}")).is_err());
    Ok(())
}

/// A waiter's JWT authenticates with its tenant, branch, and sector claims
/// carried through into the resulting identity.
#[test]
fn jwt_waiter_claims_carry_through_to_identity() -> anyhow::Result<()> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    let config = test_config();
    let claims = json!({"sub": 42, "role": "waiter", "tenant_id": 5, "branch_id": 9, "sector_ids": [1, 2]});
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(config.jwt_secret.as_bytes()))?;

    let authenticator = gateway::auth::Authenticator::from_config(&config);
    let identity = authenticator
        .jwt
        .authenticate(&format!("jwt={token}"))
        .map_err(|e| anyhow::anyhow!(e))?
        .expect("jwt query param present");
    assert_eq!(identity.role, gateway::types::Role::Waiter);
    assert_eq!(identity.tenant_id, 5);
    assert_eq!(identity.branch_id, Some(9));
    assert_eq!(identity.sector_ids, vec![1, 2]);
    Ok(())
}
