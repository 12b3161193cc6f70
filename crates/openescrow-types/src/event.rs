//! Notifications emitted by the escrow ledger.
//!
//! Events are best-effort observability: consumers treat them as
//! at-least-once and ordered per key, never as the source of truth.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AssetId, EscrowEntry, EscrowKey, PrincipalId};

/// Which transition an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Opened,
    Refunded,
    Executed,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opened => write!(f, "OPENED"),
            Self::Refunded => write!(f, "REFUNDED"),
            Self::Executed => write!(f, "EXECUTED"),
        }
    }
}

/// A ledger notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowEvent {
    /// An escrow was created and the locked amount pulled into custody.
    Opened {
        sender: PrincipalId,
        recipient: PrincipalId,
        locked_asset: AssetId,
        locked_amount: Decimal,
        counter_asset: AssetId,
        counter_amount: Decimal,
    },
    /// The sender reclaimed the locked amount after the delay.
    Refunded {
        sender: PrincipalId,
        recipient: PrincipalId,
        locked_asset: AssetId,
        locked_amount: Decimal,
    },
    /// The recipient paid the counter-asset and received the locked amount.
    Executed {
        sender: PrincipalId,
        recipient: PrincipalId,
        locked_asset: AssetId,
        locked_amount: Decimal,
        counter_asset: AssetId,
        counter_amount: Decimal,
    },
}

impl EscrowEvent {
    #[must_use]
    pub fn opened(key: &EscrowKey, entry: &EscrowEntry) -> Self {
        Self::Opened {
            sender: key.sender,
            recipient: key.recipient,
            locked_asset: key.locked_asset.clone(),
            locked_amount: entry.locked_amount,
            counter_asset: entry.counter_asset.clone(),
            counter_amount: entry.counter_amount,
        }
    }

    #[must_use]
    pub fn refunded(key: &EscrowKey, entry: &EscrowEntry) -> Self {
        Self::Refunded {
            sender: key.sender,
            recipient: key.recipient,
            locked_asset: key.locked_asset.clone(),
            locked_amount: entry.locked_amount,
        }
    }

    #[must_use]
    pub fn executed(key: &EscrowKey, entry: &EscrowEntry) -> Self {
        Self::Executed {
            sender: key.sender,
            recipient: key.recipient,
            locked_asset: key.locked_asset.clone(),
            locked_amount: entry.locked_amount,
            counter_asset: entry.counter_asset.clone(),
            counter_amount: entry.counter_amount,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Opened { .. } => EventKind::Opened,
            Self::Refunded { .. } => EventKind::Refunded,
            Self::Executed { .. } => EventKind::Executed,
        }
    }

    /// The escrow key this event concerns.
    #[must_use]
    pub fn key(&self) -> EscrowKey {
        match self {
            Self::Opened {
                sender,
                recipient,
                locked_asset,
                ..
            }
            | Self::Refunded {
                sender,
                recipient,
                locked_asset,
                ..
            }
            | Self::Executed {
                sender,
                recipient,
                locked_asset,
                ..
            } => EscrowKey::new(*sender, *recipient, locked_asset.clone()),
        }
    }

    #[must_use]
    pub fn locked_amount(&self) -> Decimal {
        match self {
            Self::Opened { locked_amount, .. }
            | Self::Refunded { locked_amount, .. }
            | Self::Executed { locked_amount, .. } => *locked_amount,
        }
    }
}

/// An event as stored by a log sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the sink, starting at 0.
    pub sequence: u64,
    /// When the sink accepted the event.
    pub recorded_at: DateTime<Utc>,
    pub event: EscrowEvent,
}
