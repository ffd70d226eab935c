// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn counts_every_drop() {
    let tracker = DropTracker::new();
    for _ in 0..250 {
        tracker.record_drop("queue_full");
    }
    assert_eq!(tracker.total(), 250);
}
