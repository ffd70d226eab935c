// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("bus publish error: {0}")]
    Bus(#[from] async_nats::Error),

    #[error("event failed validation: {0}")]
    InvalidEvent(#[from] gateway_core::CoreError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unrecognized aggregate type: {0}")]
    UnknownAggregateType(String),
}
