//! Clock capability.
//!
//! The ledger never reads wall time directly; it asks an injected [`Clock`].
//! Production uses [`SystemClock`], tests and simulations use
//! [`ManualClock`].

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};

/// A monotonically non-decreasing time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall-clock time, clamped so it never goes backwards.
///
/// If the host clock steps back (NTP adjustment), readings stay at the
/// last value returned until wall time catches up.
pub struct SystemClock {
    last: Mutex<DateTime<Utc>>,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock();
        let now = Utc::now().max(*last);
        *last = now;
        now
    }
}

/// Manually driven clock for deterministic tests and simulations.
pub struct ManualClock {
    current: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Jump to `time`. Ignored if it would move the clock backwards.
    pub fn set(&self, time: DateTime<Utc>) {
        let mut current = self.current.write();
        if time > *current {
            *current = time;
        }
    }

    /// Move forward by `delta`. Negative deltas are ignored.
    pub fn advance(&self, delta: TimeDelta) {
        if delta <= TimeDelta::zero() {
            return;
        }
        let mut current = self.current.write();
        *current = current
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.read()
    }
}
