//! Event log sinks.
//!
//! The ledger appends one [`EscrowEvent`] per successful transition. Sinks
//! are observability only: they cannot fail an operation.

use std::sync::Arc;

use chrono::Utc;
use openescrow_types::{EscrowEvent, EscrowKey, EventRecord};
use parking_lot::Mutex;

/// Append-only notification sink.
pub trait EventLog: Send + Sync {
    fn append(&self, event: EscrowEvent);
}

impl<T: EventLog + ?Sized> EventLog for Arc<T> {
    fn append(&self, event: EscrowEvent) {
        (**self).append(event);
    }
}

/// Keeps every event in memory, in append order.
pub struct MemoryEventLog {
    records: Mutex<Vec<EventRecord>>,
}

impl MemoryEventLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of all records.
    #[must_use]
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    /// Events for one key, in append order.
    #[must_use]
    pub fn events_for(&self, key: &EscrowKey) -> Vec<EscrowEvent> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.event.key() == *key)
            .map(|r| r.event.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: EscrowEvent) {
        let mut records = self.records.lock();
        let sequence = records.len() as u64;
        records.push(EventRecord {
            sequence,
            recorded_at: Utc::now(),
            event,
        });
    }
}

/// Emits each event as a JSON-encoded `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn append(&self, event: EscrowEvent) {
        let key = event.key();
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(
                target: "openescrow::events",
                kind = %event.kind(),
                slot = %key.short(),
                payload = %json,
                "Escrow event"
            ),
            Err(e) => tracing::warn!(
                target: "openescrow::events",
                kind = %event.kind(),
                slot = %key.short(),
                error = %e,
                "Escrow event could not be encoded"
            ),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventLog;

impl EventLog for NullEventLog {
    fn append(&self, _event: EscrowEvent) {}
}
