// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by event construction. Gateway- and outbox-specific
//! errors live in their own crates and convert these via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {constraint}, got {value}")]
    InvalidId {
        field: &'static str,
        constraint: &'static str,
        value: i64,
    },

    #[error("event has {count} unknown fields, exceeding the limit of {max}")]
    TooManyUnknownFields { count: usize, max: usize },

    #[error("malformed event payload: {0}")]
    MalformedPayload(String),
}
