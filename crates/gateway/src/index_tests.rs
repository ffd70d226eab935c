// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn identity(tenant: i64, branch: Option<i64>, role: Role, sectors: Vec<i64>) -> Identity {
    Identity { role, tenant_id: tenant, user_id: Some(1), branch_id: branch, sector_ids: sectors, session_id: None }
}

#[tokio::test]
async fn recipients_respect_tenant_boundary() {
    let index = ConnectionIndex::new();
    let a = ConnectionId::new_v4();
    let b = ConnectionId::new_v4();
    index.register(a, identity(1, Some(10), Role::Waiter, vec![])).await;
    index.register(b, identity(2, Some(10), Role::Waiter, vec![])).await;

    let recipients = index.recipients(1, Some(10), &[], None, true, false, false, false).await;
    assert_eq!(recipients, vec![a]);
}

#[tokio::test]
async fn unregister_removes_from_every_map() {
    let index = ConnectionIndex::new();
    let a = ConnectionId::new_v4();
    index.register(a, identity(1, Some(10), Role::Kitchen, vec![99])).await;
    index.unregister(a).await;
    assert_eq!(index.len().await, 0);
    let recipients = index.recipients(1, Some(10), &[99], None, true, true, true, true).await;
    assert!(recipients.is_empty());
}

#[tokio::test]
async fn session_recipients_require_want_session() {
    let index = ConnectionIndex::new();
    let diner = ConnectionId::new_v4();
    index
        .register(
            diner,
            Identity { role: Role::Diner, tenant_id: 1, user_id: Some(-4), branch_id: Some(10), sector_ids: vec![], session_id: Some(4) },
        )
        .await;

    let without_session = index.recipients(1, Some(10), &[], Some(4), false, false, false, false).await;
    assert!(without_session.is_empty());

    let with_session = index.recipients(1, Some(10), &[], Some(4), false, false, false, true).await;
    assert_eq!(with_session, vec![diner]);
}
