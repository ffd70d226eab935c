// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Three-state circuit breaker guarding the bus connection. One mutex
//! protects the state machine regardless of whether the caller goes
//! through the async `call` path or the sync `try_state` inspection path —
//! two separate locks here would let a state transition race between them
//! and silently lose a failure count.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use gateway_core::constants::{CIRCUIT_FAILURE_THRESHOLD, CIRCUIT_HALF_OPEN_MAX_CALLS, CIRCUIT_RECOVERY_TIMEOUT};
use tracing::{info, warn};

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
    half_open_calls: u32,
}

pub struct CircuitBreaker {
    name: &'static str,
    failure_threshold: u32,
    recovery_timeout: Duration,
    half_open_max_calls: u32,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str) -> Self {
        Self::with_params(name, CIRCUIT_FAILURE_THRESHOLD, CIRCUIT_RECOVERY_TIMEOUT, CIRCUIT_HALF_OPEN_MAX_CALLS)
    }

    pub fn with_params(name: &'static str, failure_threshold: u32, recovery_timeout: Duration, half_open_max_calls: u32) -> Self {
        Self {
            name,
            failure_threshold,
            recovery_timeout,
            half_open_max_calls,
            inner: Mutex::new(Inner { state: CircuitState::Closed, failure_count: 0, opened_at: None, half_open_calls: 0 }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("circuit breaker mutex poisoned").state
    }

    /// Call before attempting the guarded operation. Transitions Open ->
    /// HalfOpen once the recovery timeout has elapsed.
    pub fn before_call(&self) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => {
                if inner.half_open_calls >= self.half_open_max_calls {
                    return Err(GatewayError::CircuitOpen(self.name));
                }
                inner.half_open_calls += 1;
                Ok(())
            }
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.recovery_timeout {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.half_open_calls = 1;
                    Ok(())
                } else {
                    Err(GatewayError::CircuitOpen(self.name))
                }
            }
        }
    }

    pub fn on_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                self.transition(&mut inner, CircuitState::Closed);
                inner.failure_count = 0;
                inner.half_open_calls = 0;
            }
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn on_failure(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                self.transition(&mut inner, CircuitState::Open);
                inner.opened_at = Some(Instant::now());
                inner.half_open_calls = 0;
            }
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open);
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Runs an async fallible operation through the breaker, recording the
    /// outcome. This is the only entry point callers should use in
    /// practice; `before_call`/`on_success`/`on_failure` stay public for
    /// tests and for callers that can't hold a future across the guard.
    pub async fn call<F, Fut, T, E>(&self, op: F) -> Result<T, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.before_call()?;
        match op().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(_) => {
                self.on_failure();
                Err(GatewayError::CircuitOpen(self.name))
            }
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        if inner.state == to {
            return;
        }
        let from = inner.state;
        inner.state = to;
        match to {
            CircuitState::Open => warn!(circuit = self.name, ?from, "circuit breaker opened"),
            CircuitState::HalfOpen => info!(circuit = self.name, ?from, "circuit breaker half-open"),
            CircuitState::Closed => info!(circuit = self.name, ?from, "circuit breaker closed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "circuit_breaker_tests.rs"]
mod tests;
