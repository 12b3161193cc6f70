//! Per-key escrow slot store.
//!
//! Each [`EscrowKey`] maps to its own `Mutex<EscrowState>`. Holding a slot's
//! lock serializes every state-mutating operation on that key, while
//! operations on different keys proceed in parallel. The outer map lock is
//! only held long enough to find or create a slot.
//!
//! Slots are never removed implicitly: a key keeps its (possibly absent)
//! slot until [`EscrowStore::compact`] runs.

use std::{collections::HashMap, sync::Arc};

use openescrow_types::{EscrowEntry, EscrowKey, EscrowState};
use parking_lot::{Mutex, RwLock};

/// A single key's state cell.
pub type Slot = Arc<Mutex<EscrowState>>;

/// Keyed arena of escrow slots.
pub struct EscrowStore {
    slots: RwLock<HashMap<EscrowKey, Slot>>,
}

impl EscrowStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// The slot for `key`, created `Absent` on first use.
    ///
    /// Every caller for the same key gets the same `Arc`, so locking it is
    /// the per-key serialization point.
    #[must_use]
    pub fn slot(&self, key: &EscrowKey) -> Slot {
        if let Some(slot) = self.slots.read().get(key) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// The slot for `key` if one exists. Does not create.
    #[must_use]
    pub fn existing(&self, key: &EscrowKey) -> Option<Slot> {
        self.slots.read().get(key).map(Arc::clone)
    }

    /// Current state of `key` without creating a slot.
    #[must_use]
    pub fn peek(&self, key: &EscrowKey) -> EscrowState {
        let Some(slot) = self.existing(key) else {
            return EscrowState::Absent;
        };
        let state = slot.lock().clone();
        state
    }

    /// Snapshot of every live entry. Each slot is read under its own lock,
    /// so the snapshot is per-key consistent but not a global cut.
    #[must_use]
    pub fn live_entries(&self) -> Vec<(EscrowKey, EscrowEntry)> {
        let slots: Vec<(EscrowKey, Slot)> = self
            .slots
            .read()
            .iter()
            .map(|(k, s)| (k.clone(), Arc::clone(s)))
            .collect();
        slots
            .into_iter()
            .filter_map(|(key, slot)| {
                let entry = slot.lock().entry().cloned();
                entry.map(|entry| (key, entry))
            })
            .collect()
    }

    /// Number of live escrows.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.lock().is_live())
            .count()
    }

    /// Number of slots, live or absent.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.read().len()
    }

    /// Drop absent slots that nobody else holds. Returns how many went.
    ///
    /// Runs under the map write lock, so no new handle to a slot can be
    /// taken while its reference count is checked.
    pub fn compact(&self) -> usize {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|_, slot| Arc::strong_count(slot) > 1 || slot.lock().is_live());
        before - slots.len()
    }
}

impl Default for EscrowStore {
    fn default() -> Self {
        Self::new()
    }
}
