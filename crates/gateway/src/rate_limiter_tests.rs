// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn allows_up_to_limit_then_blocks() {
    let mut rl = RateLimiter::new(3, Duration::from_secs(1));
    let now = Instant::now();
    assert!(rl.check("a", now));
    assert!(rl.check("a", now));
    assert!(rl.check("a", now));
    assert!(!rl.check("a", now));
}

#[test]
fn window_slides() {
    let mut rl = RateLimiter::new(1, Duration::from_millis(10));
    let now = Instant::now();
    assert!(rl.check("a", now));
    assert!(!rl.check("a", now));
    let later = now + Duration::from_millis(20);
    assert!(rl.check("a", later));
}

#[test]
fn tracked_count_never_exceeds_max() {
    let mut rl = RateLimiter::new(20, Duration::from_secs(1));
    rl.max_tracked = 10;
    let now = Instant::now();
    for i in 0..50 {
        rl.check(&format!("conn-{i}"), now);
    }
    assert!(rl.tracked_count() <= 10);
}

proptest::proptest! {
    /// However many distinct connection ids send however many messages,
    /// the tracking table never grows past `max_tracked`.
    #[test]
    fn tracked_count_stays_bounded(connection_count in 1usize..200, hits_per_connection in 1usize..5) {
        let mut rl = RateLimiter::new(1000, Duration::from_secs(60));
        rl.max_tracked = 20;
        let now = Instant::now();
        for i in 0..connection_count {
            for _ in 0..hits_per_connection {
                rl.check(&format!("conn-{i}"), now);
            }
        }
        proptest::prop_assert!(rl.tracked_count() <= 20);
    }

    /// No connection is ever admitted more than `limit` times within a
    /// single window, regardless of how many times it's checked.
    #[test]
    fn never_exceeds_limit_within_a_window(limit in 1u32..20, attempts in 1u32..50) {
        let mut rl = RateLimiter::new(limit, Duration::from_secs(1));
        let now = Instant::now();
        let admitted = (0..attempts).filter(|_| rl.check("a", now)).count() as u32;
        proptest::prop_assert!(admitted <= limit);
    }
}
