// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide counters exposed in Prometheus text format at `GET
//! /metrics`. Kept as plain atomics rather than pulling in a metrics crate —
//! the surface is small and fixed, so a registry adds indirection without
//! buying anything.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    pub connections_active: AtomicI64,
    pub connections_total: AtomicU64,
    pub connections_rejected_capacity: AtomicU64,
    pub connections_rejected_auth: AtomicU64,
    pub events_routed_total: AtomicU64,
    pub events_dropped_total: AtomicU64,
    pub events_unknown_type_total: AtomicU64,
    pub messages_rate_limited_total: AtomicU64,
    pub lock_order_violations_total: AtomicU64,
    pub circuit_breaker_opens_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        Self::push(&mut out, "gateway_connections_active", self.connections_active.load(Ordering::Relaxed));
        Self::push(&mut out, "gateway_connections_total", self.connections_total.load(Ordering::Relaxed));
        Self::push(
            &mut out,
            "gateway_connections_rejected_capacity_total",
            self.connections_rejected_capacity.load(Ordering::Relaxed),
        );
        Self::push(&mut out, "gateway_connections_rejected_auth_total", self.connections_rejected_auth.load(Ordering::Relaxed));
        Self::push(&mut out, "gateway_events_routed_total", self.events_routed_total.load(Ordering::Relaxed));
        Self::push(&mut out, "gateway_events_dropped_total", self.events_dropped_total.load(Ordering::Relaxed));
        Self::push(&mut out, "gateway_events_unknown_type_total", self.events_unknown_type_total.load(Ordering::Relaxed));
        Self::push(&mut out, "gateway_messages_rate_limited_total", self.messages_rate_limited_total.load(Ordering::Relaxed));
        Self::push(&mut out, "gateway_lock_order_violations_total", self.lock_order_violations_total.load(Ordering::Relaxed));
        Self::push(&mut out, "gateway_circuit_breaker_opens_total", self.circuit_breaker_opens_total.load(Ordering::Relaxed));
        out
    }

    fn push(out: &mut String, name: &str, value: impl std::fmt::Display) {
        out.push_str("# TYPE ");
        out.push_str(name);
        out.push_str(" counter\n");
        out.push_str(name);
        out.push(' ');
        out.push_str(&value.to_string());
        out.push('\n');
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
