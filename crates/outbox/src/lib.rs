// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactional outbox: a business transaction writes a row here in the
//! same commit as its domain change, and a separate poller publishes it to
//! the bus at-least-once. See [`writer`] for the write side and
//! [`processor`] for the poll side.

pub mod config;
pub mod error;
pub mod processor;
pub mod row;
pub mod writer;

pub use error::OutboxError;
pub use processor::OutboxProcessor;
pub use row::{OutboxRow, OutboxStatus};
