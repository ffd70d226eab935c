// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn round_trip_preserves_typed_fields() {
    let payload = json!({
        "type": "ROUND_SUBMITTED",
        "tenant_id": 1,
        "branch_id": 10,
        "sector_id": 3,
    });
    let event = DomainEvent::from_json(&payload).unwrap();
    let rebuilt = DomainEvent::from_json(&event.to_json()).unwrap();
    assert_eq!(event.event_type, rebuilt.event_type);
    assert_eq!(event.tenant_id, rebuilt.tenant_id);
    assert_eq!(event.branch_id, rebuilt.branch_id);
    assert_eq!(event.sector_id, rebuilt.sector_id);
}

#[test]
fn redacts_sensitive_fields_in_raw() {
    let payload = json!({
        "type": "ENTITY_CREATED",
        "tenant_id": 1,
        "actor": {"email": "a@b.com", "name": "Al"},
    });
    let event = DomainEvent::from_json(&payload).unwrap();
    assert_eq!(event.raw()["actor"]["email"], json!("[REDACTED]"));
    assert_eq!(event.raw()["actor"]["name"], json!("Al"));
}

#[test]
fn rejects_non_positive_tenant_id() {
    let payload = json!({"type": "ROUND_READY", "tenant_id": 0});
    assert!(DomainEvent::from_json(&payload).is_err());
}

#[test]
fn allows_zero_branch_id_for_tenant_wide_events() {
    let payload = json!({"type": "ROUND_READY", "tenant_id": 1, "branch_id": 0});
    assert!(DomainEvent::from_json(&payload).is_ok());
}

#[test]
fn unknown_type_is_tolerated_not_rejected() {
    let payload = json!({"type": "SOMETHING_NEW", "tenant_id": 1});
    let event = DomainEvent::from_json(&payload).unwrap();
    assert!(!event.event_type.is_known());
}

#[test]
fn too_many_unknown_fields_is_rejected() {
    let mut map = Map::new();
    map.insert("type".into(), json!("ROUND_READY"));
    map.insert("tenant_id".into(), json!(1));
    for i in 0..15 {
        map.insert(format!("extra_{i}"), json!(i));
    }
    assert!(DomainEvent::from_json(&Value::Object(map)).is_err());
}

#[test]
fn unknown_type_tracker_distinguishes_first_vs_reappeared() {
    let mut tracker = UnknownEventTypeTracker::new(2);
    assert_eq!(tracker.record("A"), RecordOutcome::FirstOccurrence);
    assert_eq!(tracker.record("A"), RecordOutcome::AlreadyTracked);
    assert_eq!(tracker.record("B"), RecordOutcome::FirstOccurrence);
    // C evicts A (FIFO, cap=2)
    assert_eq!(tracker.record("C"), RecordOutcome::FirstOccurrence);
    assert_eq!(tracker.record("A"), RecordOutcome::Reappeared);
}
