//! Asset-transfer capability consumed by the ledger and the vault.
//!
//! Implementations must apply a batch of legs all-or-nothing: when
//! `execute` returns an error, no balance anywhere has changed.

use std::sync::Arc;

use openescrow_types::{AssetId, PrincipalId, Result, TransferLeg};
use rust_decimal::Decimal;

/// Moves fungible value between principals.
pub trait AssetTransfer: Send + Sync {
    /// Apply every leg, in order, or none of them.
    ///
    /// # Errors
    /// `InsufficientFundsOrAllowance` if any source cannot cover its leg
    /// (taking earlier legs in the batch into account).
    fn execute(&self, legs: &[TransferLeg]) -> Result<()>;

    /// Current balance of `owner` in `asset`.
    fn balance_of(&self, asset: &AssetId, owner: PrincipalId) -> Decimal;

    /// Debit `from`, credit `to`.
    fn pull(
        &self,
        asset: &AssetId,
        from: PrincipalId,
        to: PrincipalId,
        amount: Decimal,
    ) -> Result<()> {
        self.execute(&[TransferLeg::new(asset.clone(), from, to, amount)])
    }

    /// Credit `to` out of `custody`'s own balance.
    fn push(
        &self,
        asset: &AssetId,
        custody: PrincipalId,
        to: PrincipalId,
        amount: Decimal,
    ) -> Result<()> {
        self.execute(&[TransferLeg::new(asset.clone(), custody, to, amount)])
    }
}

impl<T: AssetTransfer + ?Sized> AssetTransfer for Arc<T> {
    fn execute(&self, legs: &[TransferLeg]) -> Result<()> {
        (**self).execute(legs)
    }

    fn balance_of(&self, asset: &AssetId, owner: PrincipalId) -> Decimal {
        (**self).balance_of(asset, owner)
    }
}
