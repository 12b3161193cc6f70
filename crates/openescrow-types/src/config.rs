//! Configuration types for the escrow ledger and the share vault.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{AssetId, EscrowError, Result, constants};

/// What `settle` does when nothing is pending for the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentSettlePolicy {
    /// Succeed without moving funds or emitting an event. Unlike a
    /// zero-amount transfer pair, nothing reaches the event log.
    #[default]
    NoOp,
    /// Fail with `NoSuchEscrow`.
    Reject,
}

/// Configuration for one escrow ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Seconds after `opened_at` before the sender may refund.
    pub refund_delay_secs: u64,
    /// Behavior of `settle` on an absent key.
    pub absent_settle: AbsentSettlePolicy,
    /// Require `refund`'s `sender` argument to equal the caller.
    pub strict_refund_sender: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            refund_delay_secs: constants::REFUND_DELAY_SECS,
            absent_settle: AbsentSettlePolicy::NoOp,
            strict_refund_sender: true,
        }
    }
}

impl LedgerConfig {
    /// Parse from JSON and validate. Missing fields take their defaults.
    ///
    /// # Errors
    /// `Configuration` on malformed JSON or an out-of-range delay.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| EscrowError::Configuration(format!("invalid ledger config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject delays that cannot be represented as a `TimeDelta`.
    ///
    /// # Errors
    /// `Configuration` if `refund_delay_secs` is out of range.
    pub fn validate(&self) -> Result<()> {
        self.try_refund_delay().map(|_| ())
    }

    /// The refund delay.
    ///
    /// Call [`validate`](Self::validate) first; an unrepresentable delay
    /// saturates to `TimeDelta::MAX`.
    #[must_use]
    pub fn refund_delay(&self) -> TimeDelta {
        self.try_refund_delay().unwrap_or(TimeDelta::MAX)
    }

    fn try_refund_delay(&self) -> Result<TimeDelta> {
        i64::try_from(self.refund_delay_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                EscrowError::Configuration(format!(
                    "refund_delay_secs {} out of range",
                    self.refund_delay_secs
                ))
            })
    }
}

/// Configuration for a proportional-share vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// The single asset the vault accepts.
    pub asset: AssetId,
    /// Decimal places kept on minted shares and redeemed amounts.
    #[serde(default = "default_share_scale")]
    pub share_scale: u32,
}

fn default_share_scale() -> u32 {
    constants::DEFAULT_SHARE_SCALE
}

impl VaultConfig {
    #[must_use]
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            share_scale: constants::DEFAULT_SHARE_SCALE,
        }
    }
}
