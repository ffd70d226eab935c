// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::error;

use outbox::config::OutboxConfig;
use outbox::OutboxProcessor;

#[tokio::main]
async fn main() {
    let config = OutboxConfig::parse();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: OutboxConfig) -> anyhow::Result<()> {
    let pool = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    let bus = async_nats::connect(&config.nats_url).await?;
    let cancel = CancellationToken::new();

    let mut workers = Vec::new();
    for _ in 0..config.worker_count.max(1) {
        let processor = OutboxProcessor::new(pool.clone(), bus.clone(), &config);
        let cancel = cancel.clone();
        workers.push(tokio::spawn(processor.run(cancel)));
    }

    tokio::signal::ctrl_c().await?;
    cancel.cancel();
    for worker in workers {
        let _ = worker.await;
    }
    Ok(())
}
