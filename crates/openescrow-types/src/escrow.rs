//! # Escrow model — composite key, pending entry, and per-key state
//!
//! An escrow locks `locked_amount` of `locked_asset` from a sender for a
//! named recipient. The recipient unlocks it by paying `counter_amount` of
//! `counter_asset` to the sender; otherwise the sender may reclaim it once
//! the refund delay has elapsed.
//!
//! ## State Machine (per key)
//!
//! ```text
//!            open (sender)
//!   ┌────────┐ ───────────▶ ┌──────┐
//!   │ ABSENT │              │ LIVE │
//!   └────────┘ ◀─────────── └──────┘
//!       ▲  │   refund (sender, after delay)
//!       │  │   settle (recipient, any time)
//!       └──┘
//!   settle on ABSENT: no-op
//! ```
//!
//! A key may cycle through `LIVE` any number of times over its history.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AssetId, PrincipalId};

// ---------------------------------------------------------------------------
// EscrowKey
// ---------------------------------------------------------------------------

/// Composite identity of an escrow: at most one live escrow per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EscrowKey {
    pub sender: PrincipalId,
    pub recipient: PrincipalId,
    pub locked_asset: AssetId,
}

impl EscrowKey {
    #[must_use]
    pub fn new(sender: PrincipalId, recipient: PrincipalId, locked_asset: AssetId) -> Self {
        Self {
            sender,
            recipient,
            locked_asset,
        }
    }

    /// Stable 32-byte slot identity for this key.
    ///
    /// Every node derives the same slot id for the same triple, so it can be
    /// used to correlate log lines and events across processes.
    #[must_use]
    pub fn slot_id(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"openescrow:slot:v1:");
        hasher.update(self.sender.as_bytes());
        hasher.update(self.recipient.as_bytes());
        // Length-prefixed so the asset id is the only variable-width field.
        hasher.update((self.locked_asset.as_str().len() as u64).to_le_bytes());
        hasher.update(self.locked_asset.as_str().as_bytes());
        hasher.finalize().into()
    }

    /// First 4 bytes of the slot id, hex-encoded. Handy in log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.slot_id()[..4])
    }
}

impl fmt::Display for EscrowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "escrow:{}->{}:{}",
            self.sender, self.recipient, self.locked_asset
        )
    }
}

// ---------------------------------------------------------------------------
// EscrowEntry
// ---------------------------------------------------------------------------

/// A pending exchange held by the ledger.
///
/// `opened_at` is written once, when the entry is created, and never
/// changes while the entry is live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEntry {
    /// Amount of the key's `locked_asset` held in custody.
    pub locked_amount: Decimal,
    /// Asset the recipient must supply to unlock.
    pub counter_asset: AssetId,
    /// Amount of `counter_asset` the recipient must supply.
    pub counter_amount: Decimal,
    /// Clock reading at creation.
    pub opened_at: DateTime<Utc>,
}

impl EscrowEntry {
    /// Earliest instant after which the sender may refund.
    ///
    /// Saturates at `DateTime::<Utc>::MAX_UTC` rather than overflowing.
    #[must_use]
    pub fn unlocks_at(&self, refund_delay: TimeDelta) -> DateTime<Utc> {
        self.opened_at
            .checked_add_signed(refund_delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Refund is permitted strictly after `opened_at + refund_delay`.
    #[must_use]
    pub fn is_refundable(&self, now: DateTime<Utc>, refund_delay: TimeDelta) -> bool {
        now > self.unlocks_at(refund_delay)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl EscrowEntry {
    pub fn dummy(locked_amount: Decimal, counter_amount: Decimal) -> Self {
        Self {
            locked_amount,
            counter_asset: AssetId::new("USDC"),
            counter_amount,
            opened_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EscrowState
// ---------------------------------------------------------------------------

/// What the ledger holds for one key.
///
/// An explicit tag rather than an all-zero sentinel, so a live entry can
/// never be mistaken for absence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "entry", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowState {
    /// No escrow exists for this key.
    #[default]
    Absent,
    /// Exactly one pending exchange.
    Live(EscrowEntry),
}

impl EscrowState {
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The live entry, if any.
    #[must_use]
    pub fn entry(&self) -> Option<&EscrowEntry> {
        match self {
            Self::Live(entry) => Some(entry),
            Self::Absent => None,
        }
    }

    /// Clear to `Absent`, returning whatever was held.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl fmt::Display for EscrowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "ABSENT"),
            Self::Live(_) => write!(f, "LIVE"),
        }
    }
}

// ---------------------------------------------------------------------------
// SettleOutcome
// ---------------------------------------------------------------------------

/// Result of a successful `settle` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettleOutcome {
    /// Both legs moved; carries the entry that was cleared.
    Executed(EscrowEntry),
    /// Nothing was pending for the key; no funds moved.
    NothingPending,
}

impl SettleOutcome {
    #[must_use]
    pub fn executed(&self) -> Option<&EscrowEntry> {
        match self {
            Self::Executed(entry) => Some(entry),
            Self::NothingPending => None,
        }
    }
}
