// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn expires_past_timeout() {
    let tracker = HeartbeatTracker::new(Duration::from_millis(10));
    let id = ConnectionId::new_v4();
    let t0 = Instant::now();
    tracker.touch(id, t0).await;
    assert!(!tracker.is_expired(id, t0).await);
    assert!(tracker.is_expired(id, t0 + Duration::from_millis(20)).await);
}
