//! Custody invariant checker.
//!
//! Invariant enforced between operations:
//! ```text
//! ∀ asset: custody_balance(asset) == Σ locked_amount over live escrows locking asset
//! ```
//!
//! Custody holds funds exactly while an escrow for them is live. If the two
//! sides ever disagree, value has been created or lost.

use std::collections::{BTreeSet, HashMap};

use openescrow_types::{AssetId, EscrowEntry, EscrowError, EscrowKey, Result};
use rust_decimal::Decimal;

/// Expected custody per asset, accumulated from a snapshot of live entries.
pub struct CustodyAudit {
    expected: HashMap<AssetId, Decimal>,
    live: HashMap<AssetId, usize>,
}

impl CustodyAudit {
    #[must_use]
    pub fn new() -> Self {
        Self {
            expected: HashMap::new(),
            live: HashMap::new(),
        }
    }

    /// Build from `(key, entry)` pairs.
    #[must_use]
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a (EscrowKey, EscrowEntry)>,
    {
        let mut audit = Self::new();
        for (key, entry) in entries {
            audit.record_live(&key.locked_asset, entry.locked_amount);
        }
        audit
    }

    /// Account for one live escrow locking `amount` of `asset`.
    pub fn record_live(&mut self, asset: &AssetId, amount: Decimal) {
        *self.expected.entry(asset.clone()).or_insert(Decimal::ZERO) += amount;
        *self.live.entry(asset.clone()).or_insert(0) += 1;
    }

    /// Custody the live escrows say should be held for `asset`.
    #[must_use]
    pub fn expected_custody(&self, asset: &AssetId) -> Decimal {
        self.expected.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Number of live escrows locking `asset`.
    #[must_use]
    pub fn live_count(&self, asset: &AssetId) -> usize {
        self.live.get(asset).copied().unwrap_or(0)
    }

    /// Verify that the actual custody balance matches the expected one.
    ///
    /// # Errors
    /// Returns [`EscrowError::CustodyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, asset: &AssetId, actual_custody: Decimal) -> Result<()> {
        let expected = self.expected_custody(asset);
        if actual_custody != expected {
            return Err(EscrowError::CustodyInvariantViolation {
                reason: format!(
                    "Asset {asset}: custody {actual_custody} != expected {expected} \
                     ({} live escrows)",
                    self.live_count(asset),
                ),
            });
        }
        Ok(())
    }

    /// Assets with at least one live escrow, sorted.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<AssetId> {
        self.expected
            .keys()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Default for CustodyAudit {
    fn default() -> Self {
        Self::new()
    }
}
