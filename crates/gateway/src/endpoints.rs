// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP and WebSocket surface: one upgrade handler per role
//! (`/ws/waiter`, `/ws/kitchen`, `/ws/admin`, `/ws/diner`), plus `/health`
//! and `/metrics`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{ConnectInfo, RawQuery, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use gateway_core::constants::{MAX_MESSAGE_SIZE, MSG_PING_JSON, MSG_PING_PLAIN, MSG_PONG_JSON, MSG_REFRESH_SECTORS};
use gateway_core::DomainEvent;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::auth::query_param;
use crate::error::GatewayError;
use crate::state::GatewayState;
use crate::types::{ConnectionId, Identity, Role};

/// Roles a JWT-authenticated identity must carry to use a given endpoint.
/// There is no separate "manager" role in this gateway's claims — a manager
/// JWT is issued with `role: "admin"` upstream.
const WAITER_ROLES: &[Role] = &[Role::Waiter, Role::Admin];
const KITCHEN_ROLES: &[Role] = &[Role::Kitchen, Role::Admin];
const ADMIN_ROLES: &[Role] = &[Role::Admin];

pub fn router(state: Arc<GatewayState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/ws/waiter", get(ws_waiter_handler))
        .route("/ws/kitchen", get(ws_kitchen_handler))
        .route("/ws/admin", get(ws_admin_handler))
        .route("/ws/diner", get(ws_diner_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn metrics_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    state.metrics.render()
}

fn origin_allowed(headers: &HeaderMap, allowed: &[String]) -> bool {
    let Some(origin) = headers.get(axum::http::header::ORIGIN).and_then(|v| v.to_str().ok()) else {
        return true;
    };
    allowed.iter().any(|a| a == origin)
}

async fn ws_waiter_handler(
    state: State<Arc<GatewayState>>,
    conn_info: ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: RawQuery,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade(state, conn_info, headers, query, ws, Role::Waiter)
}

async fn ws_kitchen_handler(
    state: State<Arc<GatewayState>>,
    conn_info: ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: RawQuery,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade(state, conn_info, headers, query, ws, Role::Kitchen)
}

async fn ws_admin_handler(
    state: State<Arc<GatewayState>>,
    conn_info: ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: RawQuery,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade(state, conn_info, headers, query, ws, Role::Admin)
}

async fn ws_diner_handler(
    state: State<Arc<GatewayState>>,
    conn_info: ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: RawQuery,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade(state, conn_info, headers, query, ws, Role::Diner)
}

fn upgrade(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    ws: WebSocketUpgrade,
    endpoint: Role,
) -> axum::response::Response {
    if !origin_allowed(&headers, &state.config.allowed_origins) {
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }

    let query = query.unwrap_or_default();
    ws.on_upgrade(move |socket| accept_and_serve(socket, state, query, endpoint)).into_response()
}

/// Authenticates a connection for the given endpoint role. Waiter/kitchen/
/// admin endpoints carry a JWT and must present one of that endpoint's
/// allowed roles; the diner endpoint carries a table token and never a JWT,
/// so there is nothing to periodically revalidate. Returns the identity
/// plus the raw JWT (for later revalidation) when one applies.
fn authenticate_for_endpoint(
    state: &GatewayState,
    query: &str,
    endpoint: Role,
) -> Result<(Identity, Option<String>), GatewayError> {
    if endpoint == Role::Diner {
        let identity = state
            .authenticator
            .table_token
            .authenticate(query)?
            .ok_or_else(|| GatewayError::AuthFailed("missing table token".into()))?;
        return Ok((identity, None));
    }

    let allowed_roles = match endpoint {
        Role::Waiter => WAITER_ROLES,
        Role::Kitchen => KITCHEN_ROLES,
        Role::Admin => ADMIN_ROLES,
        Role::Diner => unreachable!("handled above"),
    };

    let identity = state
        .authenticator
        .jwt
        .authenticate(query)?
        .ok_or_else(|| GatewayError::AuthFailed("missing jwt".into()))?;
    if !allowed_roles.contains(&identity.role) {
        return Err(GatewayError::RoleNotAllowed(identity.role));
    }
    let token = query_param(query, "jwt").map(str::to_string);
    Ok((identity, token))
}

async fn accept_and_serve(mut socket: WebSocket, state: Arc<GatewayState>, query: String, endpoint: Role) {
    if state.total_connections().await >= state.config.max_total_connections {
        state.metrics.connections_rejected_capacity.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        close_with(&mut socket, GatewayError::CapacityExceeded).await;
        return;
    }

    let (mut identity, jwt_token) = match authenticate_for_endpoint(&state, &query, endpoint) {
        Ok(pair) => pair,
        Err(err) => {
            state.metrics.connections_rejected_auth.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            close_with(&mut socket, err).await;
            return;
        }
    };

    if let Some(user_id) = identity.user_id {
        let existing = state.index.connections_for_user(user_id).await.len();
        if existing >= state.config.max_connections_per_user {
            close_with(&mut socket, GatewayError::PerUserCapacityExceeded).await;
            return;
        }
    }

    if identity.role == Role::Waiter {
        refresh_sector_assignments(&state, &mut identity).await;
    }

    let conn_id = ConnectionId::new_v4();
    let (tx, mut rx) = tokio::sync::mpsc::channel::<std::sync::Arc<serde_json::Value>>(256);

    state.index.register(conn_id, identity.clone()).await;
    state.register_sender(conn_id, tx).await;
    state.heartbeats.touch(conn_id, Instant::now()).await;
    info!(%conn_id, role = identity.role.as_str(), "connection accepted");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let receive_timeout = state.config.receive_timeout();
    let revalidation_interval = state.config.jwt_revalidation_interval();
    let mut last_jwt_revalidation = Instant::now();

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            outgoing = rx.recv() => {
                match outgoing {
                    Some(payload) => {
                        let text = payload.to_string();
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            incoming = tokio::time::timeout(receive_timeout, ws_rx.next()) => {
                match incoming {
                    Ok(Some(Ok(Message::Text(text)))) => {
                        state.heartbeats.touch(conn_id, Instant::now()).await;
                        if text.len() > MAX_MESSAGE_SIZE {
                            break;
                        }
                        if !rate_limit_ok(&state, conn_id).await {
                            break;
                        }

                        if let Some(token) = &jwt_token {
                            if last_jwt_revalidation.elapsed() >= revalidation_interval
                                && state.authenticator.jwt.revalidate(token).is_err()
                            {
                                close_ws_tx(&mut ws_tx, GatewayError::AuthFailed("token expired or revoked".into())).await;
                                break;
                            }
                            last_jwt_revalidation = Instant::now();
                        }

                        match handle_inbound(&state, conn_id, &mut identity, jwt_token.as_deref(), &mut last_jwt_revalidation, &text).await {
                            Ok(Some(reply)) => {
                                if ws_tx.send(Message::Text(reply.into())).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(err) => {
                                close_ws_tx(&mut ws_tx, err).await;
                                break;
                            }
                        }
                    }
                    Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {
                        state.heartbeats.touch(conn_id, Instant::now()).await;
                    }
                    Ok(Some(Ok(Message::Binary(_)))) => {
                        close_ws_tx(&mut ws_tx, GatewayError::UnsupportedData).await;
                        break;
                    }
                    Ok(Some(Ok(Message::Close(_)))) | Ok(None) => break,
                    Ok(Some(Err(_))) => break,
                    Err(_) => {
                        warn!(%conn_id, "connection timed out waiting for a frame");
                        break;
                    }
                }
            }
        }
    }

    state.index.unregister(conn_id).await;
    state.remove_sender(conn_id).await;
    state.heartbeats.forget(conn_id).await;
    info!(%conn_id, "connection closed");
}

async fn refresh_sector_assignments(state: &GatewayState, identity: &mut Identity) {
    let Some(repo) = &state.sector_repository else { return };
    let Some(user_id) = identity.user_id else { return };
    identity.sector_ids = repo.sectors_for_waiter(user_id, identity.tenant_id).await;
}

async fn rate_limit_ok(state: &GatewayState, conn_id: ConnectionId) -> bool {
    let mut limiter = state.rate_limiter.lock().await;
    let ok = limiter.check(&conn_id.to_string(), Instant::now());
    if !ok {
        state.metrics.messages_rate_limited_total.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
    ok
}

fn is_ping_frame(text: &str) -> bool {
    if text == MSG_PING_PLAIN || text == MSG_PING_JSON {
        return true;
    }
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_string))
        .is_some_and(|t| t == "ping")
}

/// Handles a text frame from the client. Diners are the only role
/// permitted to originate domain events from the connection itself (e.g. a
/// service call); waiter/kitchen/admin connections are otherwise read-only
/// subscribers fed entirely by the bus, save for the two control messages
/// below that every role may send.
async fn handle_inbound(
    state: &GatewayState,
    conn_id: ConnectionId,
    identity: &mut Identity,
    jwt_token: Option<&str>,
    last_jwt_revalidation: &mut Instant,
    text: &str,
) -> Result<Option<String>, GatewayError> {
    let trimmed = text.trim();

    if is_ping_frame(trimmed) {
        return Ok(Some(MSG_PONG_JSON.to_string()));
    }

    if trimmed == MSG_REFRESH_SECTORS {
        if identity.role != Role::Waiter {
            debug!(role = identity.role.as_str(), "refresh_sectors ignored for non-waiter role");
            return Ok(None);
        }
        if let Some(token) = jwt_token {
            if state.authenticator.jwt.revalidate(token).is_err() {
                return Err(GatewayError::AuthFailed("token expired or revoked".into()));
            }
            *last_jwt_revalidation = Instant::now();
        }

        let sector_ids = match &state.sector_repository {
            Some(repo) => repo.sectors_for_waiter(identity.user_id.unwrap_or_default(), identity.tenant_id).await,
            None => Vec::new(),
        };
        identity.sector_ids = sector_ids.clone();
        state.index.unregister(conn_id).await;
        state.index.register(conn_id, identity.clone()).await;

        let csv = sector_ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        return Ok(Some(format!("sectors_updated:{csv}")));
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        debug!(%conn_id, "ignored unrecognized inbound frame");
        return Ok(None);
    };
    match DomainEvent::from_json(&value) {
        Ok(_) => {}
        Err(err) => warn!(err = %err, "rejected malformed inbound event"),
    }
    Ok(None)
}

async fn close_with(socket: &mut WebSocket, err: GatewayError) {
    let code = err.close_code();
    let _ = socket
        .send(Message::Close(Some(CloseFrame { code: code.code(), reason: code.reason().into() })))
        .await;
}

async fn close_ws_tx(ws_tx: &mut SplitSink<WebSocket, Message>, err: GatewayError) {
    let code = err.close_code();
    let _ = ws_tx
        .send(Message::Close(Some(CloseFrame { code: code.code(), reason: code.reason().into() })))
        .await;
}
