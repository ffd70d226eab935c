// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn backoff_doubles_and_caps() {
    assert_eq!(calculate_backoff(0), Duration::from_secs(1));
    assert_eq!(calculate_backoff(1), Duration::from_secs(2));
    assert_eq!(calculate_backoff(10), gateway_core::constants::RECONNECT_MAX_DELAY);
}

#[test]
fn status_variants_round_trip_through_matches() {
    for status in [OutboxStatus::Pending, OutboxStatus::Processing, OutboxStatus::Published, OutboxStatus::Failed] {
        assert!(matches!(status, OutboxStatus::Pending | OutboxStatus::Processing | OutboxStatus::Published | OutboxStatus::Failed));
    }
}
