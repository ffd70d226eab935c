// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn opens_after_threshold_failures() {
    let cb = CircuitBreaker::with_params("test", 3, Duration::from_secs(60), 2);
    for _ in 0..3 {
        cb.before_call().unwrap();
        cb.on_failure();
    }
    assert_eq!(cb.state(), CircuitState::Open);
    assert!(cb.before_call().is_err());
}

#[test]
fn same_state_transition_is_a_no_op() {
    let cb = CircuitBreaker::with_params("test", 1, Duration::from_secs(60), 1);
    cb.before_call().unwrap();
    cb.on_failure();
    assert_eq!(cb.state(), CircuitState::Open);
    assert!(cb.before_call().is_err());
    assert_eq!(cb.state(), CircuitState::Open);
}

#[test]
fn half_open_success_closes() {
    let cb = CircuitBreaker::with_params("test", 1, Duration::from_millis(1), 1);
    cb.before_call().unwrap();
    cb.on_failure();
    std::thread::sleep(Duration::from_millis(5));
    cb.before_call().unwrap();
    cb.on_success();
    assert_eq!(cb.state(), CircuitState::Closed);
}
