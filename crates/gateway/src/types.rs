// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared identifiers used across the connection index, router, and
//! lifecycle modules.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique per-socket identifier, assigned at accept time.
pub type ConnectionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Waiter,
    Kitchen,
    Admin,
    Diner,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Waiter => "waiter",
            Role::Kitchen => "kitchen",
            Role::Admin => "admin",
            Role::Diner => "diner",
        }
    }
}

/// What a connection identifies as, established at handshake and immutable
/// for the socket's lifetime.
#[derive(Debug, Clone)]
pub struct Identity {
    pub role: Role,
    pub tenant_id: i64,
    pub user_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub sector_ids: Vec<i64>,
    pub session_id: Option<i64>,
}
