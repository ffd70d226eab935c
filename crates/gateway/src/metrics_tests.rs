// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn render_includes_every_counter() {
    let metrics = Metrics::new();
    metrics.connections_total.fetch_add(3, Ordering::Relaxed);
    let text = metrics.render();
    assert!(text.contains("gateway_connections_total 3"));
    assert!(text.contains("gateway_circuit_breaker_opens_total 0"));
}
