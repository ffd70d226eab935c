// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a [`DomainEvent`]'s type to the set of connection roles that should
//! receive it. The matrix below is the single source of truth for fan-out —
//! everything downstream (the broadcaster) just asks `route` who to send to.

use gateway_core::{DomainEvent, EventType};
use tokio::sync::Mutex;

use gateway_core::constants::MAX_UNKNOWN_EVENT_TYPES;
use gateway_core::event::UnknownEventTypeTracker;

/// Which connection populations an event should reach. `sector_scoped`
/// means waiters are matched by sector membership when the event carries
/// sector ids, falling back to branch-wide waiters otherwise; it has no
/// effect when `waiters` is false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Route {
    pub admin: bool,
    pub waiters: bool,
    pub kitchen: bool,
    pub session: bool,
    pub sector_scoped: bool,
}

pub struct EventRouter {
    unknown_types: Mutex<UnknownEventTypeTracker>,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self { unknown_types: Mutex::new(UnknownEventTypeTracker::new(MAX_UNKNOWN_EVENT_TYPES)) }
    }

    pub async fn route(&self, event: &DomainEvent) -> Route {
        match &event.event_type {
            EventType::Unknown(name) => {
                let mut tracker = self.unknown_types.lock().await;
                tracker.record(name);
                Route::default()
            }
            known => Self::route_known(known),
        }
    }

    fn route_known(event_type: &EventType) -> Route {
        use EventType::*;
        match event_type {
            EntityCreated | EntityUpdated | EntityDeleted | CascadeDelete => {
                Route { admin: true, ..Route::default() }
            }
            RoundPending => Route { admin: true, waiters: true, sector_scoped: false, ..Route::default() },
            TableSessionStarted => {
                Route { admin: true, waiters: true, session: true, sector_scoped: false, ..Route::default() }
            }
            RoundSubmitted => Route { admin: true, waiters: true, sector_scoped: true, ..Route::default() },
            RoundInKitchen | RoundReady => {
                Route { admin: true, waiters: true, kitchen: true, session: true, sector_scoped: true }
            }
            RoundServed | RoundCanceled => {
                Route { admin: true, waiters: true, session: true, sector_scoped: true, ..Route::default() }
            }
            ServiceCallCreated | ServiceCallAcked | ServiceCallClosed => {
                Route { admin: true, waiters: true, sector_scoped: true, ..Route::default() }
            }
            CheckRequested | CheckPaid | PaymentApproved | PaymentRejected | PaymentFailed => {
                Route { admin: true, waiters: true, session: true, sector_scoped: true, ..Route::default() }
            }
            TableCleared | TableStatusChanged => Route { admin: true, session: true, ..Route::default() },
            TicketInProgress | TicketReady | TicketDelivered => Route { kitchen: true, ..Route::default() },
            Unknown(_) => Route::default(),
        }
    }

    pub async fn unknown_type_count(&self) -> usize {
        self.unknown_types.lock().await.tracked_count()
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
