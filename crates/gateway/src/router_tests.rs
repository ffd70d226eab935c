// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn round_submitted_excludes_kitchen() {
    let route = EventRouter::route_known(&EventType::RoundSubmitted);
    assert!(!route.kitchen);
    assert!(route.admin && route.waiters);
}

#[test]
fn round_in_kitchen_includes_kitchen_and_session() {
    let route = EventRouter::route_known(&EventType::RoundInKitchen);
    assert!(route.kitchen && route.session && route.admin && route.waiters);
}

#[test]
fn ticket_events_are_kitchen_only() {
    let route = EventRouter::route_known(&EventType::TicketReady);
    assert_eq!(route, Route { kitchen: true, ..Route::default() });
}

#[test]
fn entity_events_are_admin_only() {
    let route = EventRouter::route_known(&EventType::EntityUpdated);
    assert_eq!(route, Route { admin: true, ..Route::default() });
}

#[test]
fn round_pending_does_not_reach_the_session() {
    let route = EventRouter::route_known(&EventType::RoundPending);
    assert!(route.admin && route.waiters);
    assert!(!route.session);
}

#[test]
fn table_session_started_reaches_the_session() {
    let route = EventRouter::route_known(&EventType::TableSessionStarted);
    assert!(route.admin && route.waiters && route.session);
}
