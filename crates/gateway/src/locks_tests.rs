// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn ascending_order_is_allowed() {
    let manager = LockManager::new();
    let mut seq = LockSequence::new(manager);
    seq.acquire_connection_counter().await.unwrap();
    seq.acquire_user(5).await.unwrap();
    seq.acquire_branches(&[3, 1, 2]).await.unwrap();
    seq.acquire_sector().await.unwrap();
    seq.acquire_session().await.unwrap();
    seq.acquire_dead_connections().await.unwrap();
    assert_eq!(seq.held_count(), 6);
}

#[tokio::test]
async fn descending_order_is_rejected() {
    let manager = LockManager::new();
    let mut seq = LockSequence::new(manager);
    seq.acquire_branch(1).await.unwrap();
    let err = seq.acquire_user(1).await.unwrap_err();
    assert!(matches!(err, GatewayError::LockOrderViolation { .. }));
}

#[tokio::test]
async fn shards_are_cached_and_reused() {
    let manager = LockManager::new();
    let a = manager.branch_lock(42).await;
    let b = manager.branch_lock(42).await;
    assert!(Arc::ptr_eq(&a, &b));
}

fn order_at(index: u8) -> LockOrder {
    match index {
        0 => LockOrder::ConnectionCounter,
        1 => LockOrder::User,
        2 => LockOrder::Branch,
        3 => LockOrder::Sector,
        4 => LockOrder::Session,
        _ => LockOrder::DeadConnections,
    }
}

async fn acquire_by_index(seq: &mut LockSequence, index: u8) -> Result<(), GatewayError> {
    match order_at(index) {
        LockOrder::ConnectionCounter => seq.acquire_connection_counter().await,
        LockOrder::User => seq.acquire_user(1).await,
        LockOrder::Branch => seq.acquire_branch(1).await,
        LockOrder::Sector => seq.acquire_sector().await,
        LockOrder::Session => seq.acquire_session().await,
        LockOrder::DeadConnections => seq.acquire_dead_connections().await,
    }
}

proptest::proptest! {
    /// For any sequence of lock-order acquisitions, the sequence
    /// succeeds in full if and only if the orders it names never
    /// decrease — the invariant `LockSequence` exists to enforce.
    #[test]
    fn only_non_decreasing_sequences_fully_acquire(indices in proptest::collection::vec(0u8..6, 1..10)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let manager = LockManager::new();
            let mut seq = LockSequence::new(manager);
            let mut all_ok = true;
            for &index in &indices {
                if acquire_by_index(&mut seq, index).await.is_err() {
                    all_ok = false;
                    break;
                }
            }
            let orders: Vec<u8> = indices.iter().map(|i| order_at(*i) as u8).collect();
            let is_non_decreasing = orders.windows(2).all(|w| w[0] <= w[1]);
            proptest::prop_assert_eq!(all_ok, is_non_decreasing);
            Ok(())
        })?;
    }
}
