// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime WebSocket gateway: authenticates waiter/kitchen/admin/diner
//! connections, indexes them by tenant/branch/sector/session, and fans out
//! domain events received off the bus according to the routing matrix in
//! [`router`].

pub mod auth;
pub mod broadcaster;
pub mod bus;
pub mod circuit_breaker;
pub mod cleanup;
pub mod config;
pub mod drop_tracker;
pub mod endpoints;
pub mod error;
pub mod heartbeat;
pub mod index;
pub mod locks;
pub mod metrics;
pub mod rate_limiter;
pub mod router;
pub mod sectors;
pub mod state;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use crate::bus::BusSubscriber;
use crate::cleanup::CleanupWorker;
use crate::config::GatewayConfig;
use crate::state::GatewayState;

/// Runs the gateway until shutdown: binds the HTTP/WebSocket listener,
/// spawns the bus subscriber and cleanup worker, and serves until the
/// process receives a shutdown signal.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = GatewayState::new(config.clone());

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            config.allowed_origins.iter().filter_map(|o| o.parse().ok()),
        ))
        .allow_methods([axum::http::Method::GET]);

    let bus_subscriber = BusSubscriber::new(&config, state.bus_circuit.clone());
    let bus_state = state.clone();
    let bus_shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        let result = bus_subscriber
            .run(bus_shutdown, move |event| {
                let state = bus_state.clone();
                tokio::spawn(async move {
                    let senders = state.sender_snapshot().await;
                    state.broadcaster.broadcast(&event, &senders).await;
                });
            })
            .await;
        if let Err(err) = result {
            tracing::error!(err = %err, "bus subscriber terminated");
        }
    });

    let cleanup = CleanupWorker::new(state.heartbeats.clone(), state.lock_manager.clone(), state.rate_limiter.clone());
    let cleanup_state = state.clone();
    let cleanup_shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        cleanup
            .run(cleanup_shutdown, move |conn_id| {
                let state = cleanup_state.clone();
                tokio::spawn(async move {
                    state.remove_sender(conn_id).await;
                    state.index.unregister(conn_id).await;
                });
            })
            .await;
    });

    info!(%addr, "gateway listening");
    let router = endpoints::router(state.clone(), cors);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(state.shutdown.clone().cancelled_owned())
        .await?;

    Ok(())
}
