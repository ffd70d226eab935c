// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The domain event value object: a closed, typed event enum plus an
//! immutable, redacted payload wrapper around it.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::MAX_UNKNOWN_FIELDS;
use crate::error::CoreError;

/// Field-name substrings that mark a value as sensitive. Matching is
/// case-insensitive and substring-based, same as the source system's
/// denylist.
const SENSITIVE_FIELD_MARKERS: &[&str] = &[
    "password", "token", "secret", "card", "email", "phone", "address",
];

const REDACTED: &str = "[REDACTED]";

/// The closed event-type set. Unknown wire values are tolerated and kept
/// verbatim rather than rejected, since forward compatibility matters more
/// here than strict validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    RoundPending,
    RoundSubmitted,
    RoundInKitchen,
    RoundReady,
    RoundServed,
    RoundCanceled,
    ServiceCallCreated,
    ServiceCallAcked,
    ServiceCallClosed,
    CheckRequested,
    CheckPaid,
    PaymentApproved,
    PaymentRejected,
    PaymentFailed,
    TableCleared,
    TableSessionStarted,
    TableStatusChanged,
    TicketInProgress,
    TicketReady,
    TicketDelivered,
    EntityCreated,
    EntityUpdated,
    EntityDeleted,
    CascadeDelete,
    /// A value outside the closed set. Carried through rather than
    /// rejected; the router forwards these admin-only.
    Unknown(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::RoundPending => "ROUND_PENDING",
            EventType::RoundSubmitted => "ROUND_SUBMITTED",
            EventType::RoundInKitchen => "ROUND_IN_KITCHEN",
            EventType::RoundReady => "ROUND_READY",
            EventType::RoundServed => "ROUND_SERVED",
            EventType::RoundCanceled => "ROUND_CANCELED",
            EventType::ServiceCallCreated => "SERVICE_CALL_CREATED",
            EventType::ServiceCallAcked => "SERVICE_CALL_ACKED",
            EventType::ServiceCallClosed => "SERVICE_CALL_CLOSED",
            EventType::CheckRequested => "CHECK_REQUESTED",
            EventType::CheckPaid => "CHECK_PAID",
            EventType::PaymentApproved => "PAYMENT_APPROVED",
            EventType::PaymentRejected => "PAYMENT_REJECTED",
            EventType::PaymentFailed => "PAYMENT_FAILED",
            EventType::TableCleared => "TABLE_CLEARED",
            EventType::TableSessionStarted => "TABLE_SESSION_STARTED",
            EventType::TableStatusChanged => "TABLE_STATUS_CHANGED",
            EventType::TicketInProgress => "TICKET_IN_PROGRESS",
            EventType::TicketReady => "TICKET_READY",
            EventType::TicketDelivered => "TICKET_DELIVERED",
            EventType::EntityCreated => "ENTITY_CREATED",
            EventType::EntityUpdated => "ENTITY_UPDATED",
            EventType::EntityDeleted => "ENTITY_DELETED",
            EventType::CascadeDelete => "CASCADE_DELETE",
            EventType::Unknown(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> EventType {
        match s {
            "ROUND_PENDING" => EventType::RoundPending,
            "ROUND_SUBMITTED" => EventType::RoundSubmitted,
            "ROUND_IN_KITCHEN" => EventType::RoundInKitchen,
            "ROUND_READY" => EventType::RoundReady,
            "ROUND_SERVED" => EventType::RoundServed,
            "ROUND_CANCELED" => EventType::RoundCanceled,
            "SERVICE_CALL_CREATED" => EventType::ServiceCallCreated,
            "SERVICE_CALL_ACKED" => EventType::ServiceCallAcked,
            "SERVICE_CALL_CLOSED" => EventType::ServiceCallClosed,
            "CHECK_REQUESTED" => EventType::CheckRequested,
            "CHECK_PAID" => EventType::CheckPaid,
            "PAYMENT_APPROVED" => EventType::PaymentApproved,
            "PAYMENT_REJECTED" => EventType::PaymentRejected,
            "PAYMENT_FAILED" => EventType::PaymentFailed,
            "TABLE_CLEARED" => EventType::TableCleared,
            "TABLE_SESSION_STARTED" => EventType::TableSessionStarted,
            "TABLE_STATUS_CHANGED" => EventType::TableStatusChanged,
            "TICKET_IN_PROGRESS" => EventType::TicketInProgress,
            "TICKET_READY" => EventType::TicketReady,
            "TICKET_DELIVERED" => EventType::TicketDelivered,
            "ENTITY_CREATED" => EventType::EntityCreated,
            "ENTITY_UPDATED" => EventType::EntityUpdated,
            "ENTITY_DELETED" => EventType::EntityDeleted,
            "CASCADE_DELETE" => EventType::CascadeDelete,
            other => EventType::Unknown(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventType::Unknown(_))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventType::parse(&s))
    }
}

/// Immutable, validated, redacted event. Constructed only through
/// [`DomainEvent::from_json`].
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub event_type: EventType,
    pub tenant_id: i64,
    pub branch_id: Option<i64>,
    pub table_id: Option<i64>,
    pub session_id: Option<i64>,
    pub sector_id: Option<i64>,
    pub entity: Option<Value>,
    pub actor: Option<Value>,
    pub timestamp: Option<String>,
    pub v: Option<i64>,
    raw: Value,
}

const KNOWN_FIELDS: &[&str] = &[
    "type",
    "tenant_id",
    "branch_id",
    "table_id",
    "session_id",
    "sector_id",
    "entity",
    "actor",
    "timestamp",
    "v",
];

impl DomainEvent {
    /// Validates and constructs an event from a decoded JSON payload.
    pub fn from_json(value: &Value) -> Result<DomainEvent, CoreError> {
        let obj = value
            .as_object()
            .ok_or_else(|| CoreError::MalformedPayload("event is not a JSON object".into()))?;

        let type_str = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(CoreError::MissingField("type"))?;
        let event_type = EventType::parse(type_str);

        let tenant_id = obj
            .get("tenant_id")
            .and_then(Value::as_i64)
            .ok_or(CoreError::MissingField("tenant_id"))?;
        if tenant_id <= 0 {
            return Err(CoreError::InvalidId {
                field: "tenant_id",
                constraint: "a positive integer",
                value: tenant_id,
            });
        }

        let branch_id = read_optional_id(obj, "branch_id", 0)?;
        let table_id = read_optional_id(obj, "table_id", 1)?;
        let session_id = read_optional_id(obj, "session_id", 1)?;
        let sector_id = read_optional_id(obj, "sector_id", 1)?;

        let unknown_count = obj.keys().filter(|k| !KNOWN_FIELDS.contains(&k.as_str())).count();
        if unknown_count > MAX_UNKNOWN_FIELDS {
            return Err(CoreError::TooManyUnknownFields {
                count: unknown_count,
                max: MAX_UNKNOWN_FIELDS,
            });
        }

        let mut sanitized = Map::new();
        for (k, v) in obj {
            sanitized.insert(k.clone(), sanitize_value(k, v));
        }

        Ok(DomainEvent {
            event_type,
            tenant_id,
            branch_id,
            table_id,
            session_id,
            sector_id,
            entity: obj.get("entity").map(|v| sanitize_value("entity", v)),
            actor: obj.get("actor").map(|v| sanitize_value("actor", v)),
            timestamp: obj.get("timestamp").and_then(Value::as_str).map(str::to_string),
            v: obj.get("v").and_then(Value::as_i64),
            raw: Value::Object(sanitized),
        })
    }

    /// The sanitized raw payload as received, sensitive fields redacted.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Reconstructs the canonical wire representation from typed fields.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(self.event_type.as_str().to_string()));
        map.insert("tenant_id".into(), Value::from(self.tenant_id));
        if let Some(v) = self.branch_id {
            map.insert("branch_id".into(), Value::from(v));
        }
        if let Some(v) = self.table_id {
            map.insert("table_id".into(), Value::from(v));
        }
        if let Some(v) = self.session_id {
            map.insert("session_id".into(), Value::from(v));
        }
        if let Some(v) = self.sector_id {
            map.insert("sector_id".into(), Value::from(v));
        }
        if let Some(v) = &self.entity {
            map.insert("entity".into(), v.clone());
        }
        if let Some(v) = &self.actor {
            map.insert("actor".into(), v.clone());
        }
        if let Some(v) = &self.timestamp {
            map.insert("timestamp".into(), Value::String(v.clone()));
        }
        if let Some(v) = self.v {
            map.insert("v".into(), Value::from(v));
        }
        Value::Object(map)
    }

    pub fn is_round_event(&self) -> bool {
        self.event_type.as_str().starts_with("ROUND_")
    }

    pub fn is_payment_event(&self) -> bool {
        matches!(
            self.event_type,
            EventType::PaymentApproved | EventType::PaymentRejected | EventType::PaymentFailed
        )
    }

    pub fn is_admin_event(&self) -> bool {
        matches!(
            self.event_type,
            EventType::EntityCreated
                | EventType::EntityUpdated
                | EventType::EntityDeleted
                | EventType::CascadeDelete
        )
    }
}

fn read_optional_id(obj: &Map<String, Value>, field: &'static str, min: i64) -> Result<Option<i64>, CoreError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let n = v
                .as_i64()
                .ok_or_else(|| CoreError::MalformedPayload(format!("`{field}` must be an integer")))?;
            if n < min {
                let constraint = if min == 0 { "non-negative" } else { "a positive integer" };
                return Err(CoreError::InvalidId { field, constraint, value: n });
            }
            Ok(Some(n))
        }
    }
}

fn sanitize_value(key: &str, value: &Value) -> Value {
    let lower = key.to_ascii_lowercase();
    if SENSITIVE_FIELD_MARKERS.iter().any(|m| lower.contains(m)) {
        return Value::String(REDACTED.to_string());
    }
    match value {
        Value::Object(obj) => {
            let mut out = Map::new();
            for (k, v) in obj {
                out.insert(k.clone(), sanitize_value(k, v));
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| sanitize_value(key, v)).collect()),
        other => other.clone(),
    }
}

/// Outcome of recording an event type through [`UnknownEventTypeTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Already present in the tracker; just a repeat occurrence.
    AlreadyTracked,
    /// Never seen before.
    FirstOccurrence,
    /// Seen previously, evicted for space, and now seen again.
    Reappeared,
}

/// Bounded FIFO tracker of unknown event types seen by the router, so a
/// flood of bogus types can't grow memory without limit.
pub struct UnknownEventTypeTracker {
    order: Vec<String>,
    counts: std::collections::HashMap<String, u64>,
    evicted: std::collections::HashSet<String>,
    max: usize,
}

impl UnknownEventTypeTracker {
    pub fn new(max: usize) -> Self {
        Self {
            order: Vec::new(),
            counts: std::collections::HashMap::new(),
            evicted: std::collections::HashSet::new(),
            max,
        }
    }

    pub fn record(&mut self, type_name: &str) -> RecordOutcome {
        if let Some(count) = self.counts.get_mut(type_name) {
            *count += 1;
            return RecordOutcome::AlreadyTracked;
        }

        let reappeared = self.evicted.remove(type_name);

        if self.order.len() >= self.max && !self.order.is_empty() {
            let oldest = self.order.remove(0);
            self.counts.remove(&oldest);
            self.evicted.insert(oldest);
        }

        self.order.push(type_name.to_string());
        self.counts.insert(type_name.to_string(), 1);

        if reappeared {
            RecordOutcome::Reappeared
        } else {
            RecordOutcome::FirstOccurrence
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.order.len()
    }

    pub fn evicted_count(&self) -> usize {
        self.evicted.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "event_tests.rs"]
mod tests;
