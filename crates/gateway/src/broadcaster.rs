// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fans a routed event out to the connections selected by
//! [`crate::router::Route`], in batches, and hands each recipient's
//! serialized frame to its per-connection outbound channel.

use std::collections::HashMap;
use std::sync::Arc;

use gateway_core::DomainEvent;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::drop_tracker::DropTracker;
use crate::index::ConnectionIndex;
use crate::router::{EventRouter, Route};
use crate::types::ConnectionId;

/// One outbound frame, addressed to a connection id. The accept-loop side
/// owns the receiving half of the channel keyed by this id.
pub struct Outbound {
    pub conn_id: ConnectionId,
    pub payload: Arc<Value>,
}

pub struct Broadcaster {
    index: Arc<ConnectionIndex>,
    router: Arc<EventRouter>,
    drop_tracker: Arc<DropTracker>,
    batch_size: usize,
}

impl Broadcaster {
    pub fn new(index: Arc<ConnectionIndex>, router: Arc<EventRouter>, drop_tracker: Arc<DropTracker>, batch_size: usize) -> Self {
        Self { index, router, drop_tracker, batch_size }
    }

    /// Routes `event`, resolves recipients, and sends the serialized
    /// payload to each connection's sender. A recipient whose channel is
    /// closed or full is counted as a drop rather than treated as fatal —
    /// one stalled socket must never block the rest of the fan-out.
    pub async fn broadcast(&self, event: &DomainEvent, senders: &HashMap<ConnectionId, mpsc::Sender<Arc<Value>>>) {
        let route @ Route { admin, waiters, kitchen, session, sector_scoped } = self.router.route(event).await;
        if route == Route::default() {
            trace!(event_type = %event.event_type, "event has no routing target");
            return;
        }

        let sector_ids: Vec<i64> = if sector_scoped { event.sector_id.into_iter().collect() } else { Vec::new() };
        let recipients = self
            .index
            .recipients(
                event.tenant_id,
                event.branch_id,
                &sector_ids,
                event.session_id,
                waiters,
                kitchen,
                admin,
                session,
            )
            .await;

        if recipients.is_empty() {
            return;
        }

        let payload = Arc::new(event.to_json());
        debug!(count = recipients.len(), event_type = %event.event_type, "broadcasting event");

        for chunk in recipients.chunks(self.batch_size) {
            for conn_id in chunk {
                match senders.get(conn_id) {
                    Some(sender) => {
                        if sender.try_send(payload.clone()).is_err() {
                            self.drop_tracker.record_drop("recipient_channel_full");
                        }
                    }
                    None => self.drop_tracker.record_drop("recipient_channel_closed"),
                }
            }
        }
    }
}
