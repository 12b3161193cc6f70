//! In-memory asset book.
//!
//! Tracks per-(principal, asset) balances and implements [`AssetTransfer`]
//! with all-or-nothing batches: legs are applied to a scratch copy of the
//! touched balances, and only a fully successful batch is written back.

use std::collections::HashMap;

use openescrow_types::{AssetId, EscrowError, PrincipalId, Result, TransferLeg};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::transfer::AssetTransfer;

/// Balance store backing the transfer capability in tests, simulations,
/// and single-process hosts.
pub struct InMemoryAssetBook {
    /// Per-(principal, asset) balances.
    balances: Mutex<HashMap<(PrincipalId, AssetId), Decimal>>,
}

impl InMemoryAssetBook {
    /// Create a new empty asset book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Mint funds into `owner`'s balance (external deposit).
    ///
    /// # Errors
    /// `InvalidAmount` for negative amounts, `BalanceOverflow` if the
    /// credit does not fit.
    pub fn deposit(&self, owner: PrincipalId, asset: &AssetId, amount: Decimal) -> Result<()> {
        if amount.is_sign_negative() {
            return Err(EscrowError::InvalidAmount {
                reason: format!("deposit of {amount} {asset} is negative"),
            });
        }
        let mut balances = self.balances.lock();
        let entry = balances
            .entry((owner, asset.clone()))
            .or_insert(Decimal::ZERO);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| EscrowError::BalanceOverflow {
                asset: asset.clone(),
            })?;
        Ok(())
    }

    /// Total supply of an asset across all owners.
    #[must_use]
    pub fn total_supply(&self, asset: &AssetId) -> Decimal {
        self.balances
            .lock()
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl Default for InMemoryAssetBook {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetTransfer for InMemoryAssetBook {
    fn execute(&self, legs: &[TransferLeg]) -> Result<()> {
        if let Some(leg) = legs.iter().find(|leg| leg.amount.is_sign_negative()) {
            return Err(EscrowError::InvalidAmount {
                reason: format!("transfer leg {leg} is negative"),
            });
        }

        let mut balances = self.balances.lock();

        // Scratch copy of every balance the batch touches.
        let mut scratch: HashMap<(PrincipalId, AssetId), Decimal> = HashMap::new();
        for leg in legs.iter().filter(|leg| !leg.is_noop()) {
            let from_key = (leg.from, leg.asset.clone());
            let to_key = (leg.to, leg.asset.clone());

            let available = *scratch
                .entry(from_key.clone())
                .or_insert_with(|| balances.get(&from_key).copied().unwrap_or(Decimal::ZERO));
            if available < leg.amount {
                return Err(EscrowError::InsufficientFundsOrAllowance {
                    asset: leg.asset.clone(),
                    needed: leg.amount,
                    available,
                });
            }
            scratch.insert(from_key, available - leg.amount);

            let credited = scratch
                .entry(to_key.clone())
                .or_insert_with(|| balances.get(&to_key).copied().unwrap_or(Decimal::ZERO));
            *credited = credited
                .checked_add(leg.amount)
                .ok_or_else(|| EscrowError::BalanceOverflow {
                    asset: leg.asset.clone(),
                })?;
        }

        // Commit.
        balances.extend(scratch);
        Ok(())
    }

    fn balance_of(&self, asset: &AssetId, owner: PrincipalId) -> Decimal {
        self.balances
            .lock()
            .get(&(owner, asset.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> AssetId {
        AssetId::new("USDC")
    }

    fn weth() -> AssetId {
        AssetId::new("WETH")
    }

    #[test]
    fn deposit_increases_balance() {
        let book = InMemoryAssetBook::new();
        let user = PrincipalId::new();
        book.deposit(user, &usdc(), Decimal::new(1000, 0)).unwrap();
        assert_eq!(book.balance_of(&usdc(), user), Decimal::new(1000, 0));
    }

    #[test]
    fn negative_deposit_rejected() {
        let book = InMemoryAssetBook::new();
        let err = book
            .deposit(PrincipalId::new(), &usdc(), Decimal::new(-1, 0))
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidAmount { .. }));
    }

    #[test]
    fn pull_moves_funds() {
        let book = InMemoryAssetBook::new();
        let (a, b) = (PrincipalId::new(), PrincipalId::new());
        book.deposit(a, &usdc(), Decimal::new(100, 0)).unwrap();
        book.pull(&usdc(), a, b, Decimal::new(40, 0)).unwrap();
        assert_eq!(book.balance_of(&usdc(), a), Decimal::new(60, 0));
        assert_eq!(book.balance_of(&usdc(), b), Decimal::new(40, 0));
    }

    #[test]
    fn pull_insufficient_fails_unchanged() {
        let book = InMemoryAssetBook::new();
        let (a, b) = (PrincipalId::new(), PrincipalId::new());
        book.deposit(a, &usdc(), Decimal::new(100, 0)).unwrap();
        let err = book.pull(&usdc(), a, b, Decimal::new(101, 0)).unwrap_err();
        assert!(matches!(
            err,
            EscrowError::InsufficientFundsOrAllowance { available, .. } if available == Decimal::new(100, 0)
        ));
        assert_eq!(book.balance_of(&usdc(), a), Decimal::new(100, 0));
        assert_eq!(book.balance_of(&usdc(), b), Decimal::ZERO);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let book = InMemoryAssetBook::new();
        let (a, b, custody) = (PrincipalId::new(), PrincipalId::new(), PrincipalId::new());
        book.deposit(custody, &weth(), Decimal::new(5, 0)).unwrap();
        book.deposit(b, &usdc(), Decimal::new(10, 0)).unwrap();

        // Second leg cannot be covered: the first must not apply either.
        let legs = [
            TransferLeg::new(weth(), custody, b, Decimal::new(5, 0)),
            TransferLeg::new(usdc(), b, a, Decimal::new(11, 0)),
        ];
        assert!(book.execute(&legs).is_err());
        assert_eq!(book.balance_of(&weth(), custody), Decimal::new(5, 0));
        assert_eq!(book.balance_of(&weth(), b), Decimal::ZERO);
        assert_eq!(book.balance_of(&usdc(), b), Decimal::new(10, 0));
    }

    #[test]
    fn batch_sees_earlier_legs() {
        let book = InMemoryAssetBook::new();
        let (a, b, c) = (PrincipalId::new(), PrincipalId::new(), PrincipalId::new());
        book.deposit(a, &usdc(), Decimal::new(10, 0)).unwrap();

        // b starts empty but receives from a before paying c.
        let legs = [
            TransferLeg::new(usdc(), a, b, Decimal::new(10, 0)),
            TransferLeg::new(usdc(), b, c, Decimal::new(7, 0)),
        ];
        book.execute(&legs).unwrap();
        assert_eq!(book.balance_of(&usdc(), a), Decimal::ZERO);
        assert_eq!(book.balance_of(&usdc(), b), Decimal::new(3, 0));
        assert_eq!(book.balance_of(&usdc(), c), Decimal::new(7, 0));
    }

    #[test]
    fn batch_cannot_double_spend() {
        let book = InMemoryAssetBook::new();
        let (a, b) = (PrincipalId::new(), PrincipalId::new());
        book.deposit(a, &usdc(), Decimal::new(10, 0)).unwrap();
        let legs = [
            TransferLeg::new(usdc(), a, b, Decimal::new(6, 0)),
            TransferLeg::new(usdc(), a, b, Decimal::new(6, 0)),
        ];
        assert!(book.execute(&legs).is_err());
        assert_eq!(book.balance_of(&usdc(), a), Decimal::new(10, 0));
    }

    #[test]
    fn zero_legs_are_skipped() {
        let book = InMemoryAssetBook::new();
        let (a, b) = (PrincipalId::new(), PrincipalId::new());
        book.pull(&usdc(), a, b, Decimal::ZERO).unwrap();
        assert_eq!(book.total_supply(&usdc()), Decimal::ZERO);
    }

    #[test]
    fn negative_leg_rejected() {
        let book = InMemoryAssetBook::new();
        let (a, b) = (PrincipalId::new(), PrincipalId::new());
        let err = book.pull(&usdc(), a, b, Decimal::new(-5, 0)).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidAmount { .. }));
    }

    #[test]
    fn transfers_conserve_supply() {
        let book = InMemoryAssetBook::new();
        let users: Vec<_> = (0..4).map(|_| PrincipalId::new()).collect();
        for u in &users {
            book.deposit(*u, &usdc(), Decimal::new(100, 0)).unwrap();
        }
        book.pull(&usdc(), users[0], users[1], Decimal::new(30, 0))
            .unwrap();
        book.push(&usdc(), users[2], users[3], Decimal::new(99, 0))
            .unwrap();
        assert_eq!(book.total_supply(&usdc()), Decimal::new(400, 0));
    }
}
