// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the end-to-end scenario tests in `tests/`.

use gateway::types::{Identity, Role};

pub fn waiter(tenant_id: i64, branch_id: i64, sector_ids: Vec<i64>) -> Identity {
    Identity { role: Role::Waiter, tenant_id, user_id: Some(1), branch_id: Some(branch_id), sector_ids, session_id: None }
}

pub fn kitchen(tenant_id: i64, branch_id: i64) -> Identity {
    Identity { role: Role::Kitchen, tenant_id, user_id: Some(2), branch_id: Some(branch_id), sector_ids: vec![], session_id: None }
}

pub fn admin(tenant_id: i64, branch_id: i64) -> Identity {
    Identity { role: Role::Admin, tenant_id, user_id: Some(3), branch_id: Some(branch_id), sector_ids: vec![], session_id: None }
}

pub fn diner(tenant_id: i64, branch_id: i64, session_id: i64) -> Identity {
    Identity { role: Role::Diner, tenant_id, user_id: None, branch_id: Some(branch_id), sector_ids: vec![], session_id: Some(session_id) }
}

pub fn event(json: serde_json::Value) -> gateway_core::DomainEvent {
    gateway_core::DomainEvent::from_json(&json).expect("fixture event must be valid")
}
