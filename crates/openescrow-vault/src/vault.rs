//! Proportional-share vault.
//!
//! Depositors receive shares in proportion to their contribution to the
//! vault's custody balance:
//!
//! ```text
//! deposit:  shares = amount                              if total_shares == 0
//!           shares = amount × total_shares / custody     otherwise
//! withdraw: amount = shares × custody / total_shares
//! ```
//!
//! Both ratios use the custody balance *before* the transfer. Results are
//! rounded toward zero at the configured scale, so rounding always favors
//! the vault.

use std::collections::HashMap;

use openescrow_ledger::AssetTransfer;
use openescrow_types::{EscrowError, PrincipalId, Result, VaultConfig};
use parking_lot::Mutex;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

/// Share ledger guarded by the vault lock.
#[derive(Default)]
struct ShareBook {
    holders: HashMap<PrincipalId, Decimal>,
    total: Decimal,
}

/// Single-asset vault issuing proportional shares.
pub struct ShareVault<A> {
    config: VaultConfig,
    custody: PrincipalId,
    assets: A,
    /// Held across each transfer so the custody balance read and the
    /// transfer it prices are not interleaved with another vault call.
    book: Mutex<ShareBook>,
}

impl<A: AssetTransfer> ShareVault<A> {
    /// Create an empty vault whose funds are held by `custody`.
    #[must_use]
    pub fn new(config: VaultConfig, custody: PrincipalId, assets: A) -> Self {
        Self {
            config,
            custody,
            assets,
            book: Mutex::new(ShareBook::default()),
        }
    }

    /// Pull `amount` from `caller` and mint shares for it.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is not positive or mints zero shares
    /// - `VaultDrained` if shares exist but custody is empty
    /// - `InsufficientFundsOrAllowance` if the pull fails
    pub fn deposit(&self, caller: PrincipalId, amount: Decimal) -> Result<Decimal> {
        ensure_positive("deposit amount", amount)?;
        let mut book = self.book.lock();

        let custody = self.custody_balance();
        let shares = self.shares_for(amount, book.total, custody)?;
        if shares.is_zero() {
            return Err(EscrowError::InvalidAmount {
                reason: format!("deposit of {amount} is too small to mint a share"),
            });
        }

        self.assets
            .pull(&self.config.asset, caller, self.custody, amount)?;

        *book.holders.entry(caller).or_insert(Decimal::ZERO) += shares;
        book.total += shares;

        info!(
            asset = %self.config.asset,
            depositor = %caller,
            amount = %amount,
            shares = %shares,
            total_shares = %book.total,
            "Vault deposit"
        );
        Ok(shares)
    }

    /// Burn `shares` from `caller` and push their value out of custody.
    ///
    /// # Errors
    /// - `InvalidAmount` if `shares` is not positive
    /// - `NoSharesOutstanding` if the vault has issued no shares
    /// - `InsufficientShares` if `caller` holds fewer than `shares`
    /// - `VaultDrained` if custody is empty
    /// - `InvalidAmount` if `shares` would redeem zero after rounding
    pub fn withdraw(&self, caller: PrincipalId, shares: Decimal) -> Result<Decimal> {
        ensure_positive("withdraw shares", shares)?;
        let mut book = self.book.lock();

        if book.total.is_zero() {
            warn!(asset = %self.config.asset, "Withdraw rejected: no shares outstanding");
            return Err(EscrowError::NoSharesOutstanding);
        }
        let held = book.holders.get(&caller).copied().unwrap_or(Decimal::ZERO);
        if held < shares {
            return Err(EscrowError::InsufficientShares {
                needed: shares,
                available: held,
            });
        }

        let amount = self.amount_for(shares, book.total, self.custody_balance())?;
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount {
                reason: format!("withdraw of {shares} shares redeems nothing"),
            });
        }
        self.assets
            .push(&self.config.asset, self.custody, caller, amount)?;

        let remaining = held - shares;
        if remaining.is_zero() {
            book.holders.remove(&caller);
        } else {
            book.holders.insert(caller, remaining);
        }
        book.total -= shares;

        info!(
            asset = %self.config.asset,
            holder = %caller,
            shares = %shares,
            amount = %amount,
            total_shares = %book.total,
            "Vault withdraw"
        );
        Ok(amount)
    }

    /// Shares `deposit(amount)` would mint right now.
    ///
    /// # Errors
    /// Same pricing errors as [`Self::deposit`].
    pub fn preview_deposit(&self, amount: Decimal) -> Result<Decimal> {
        ensure_positive("deposit amount", amount)?;
        let book = self.book.lock();
        self.shares_for(amount, book.total, self.custody_balance())
    }

    /// Amount `withdraw(shares)` would return right now.
    ///
    /// # Errors
    /// `InvalidAmount`, `NoSharesOutstanding` or `VaultDrained`, as for
    /// [`Self::withdraw`].
    pub fn preview_withdraw(&self, shares: Decimal) -> Result<Decimal> {
        ensure_positive("withdraw shares", shares)?;
        let book = self.book.lock();
        if book.total.is_zero() {
            return Err(EscrowError::NoSharesOutstanding);
        }
        self.amount_for(shares, book.total, self.custody_balance())
    }

    #[must_use]
    pub fn shares_of(&self, holder: PrincipalId) -> Decimal {
        self.book
            .lock()
            .holders
            .get(&holder)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn total_shares(&self) -> Decimal {
        self.book.lock().total
    }

    #[must_use]
    pub fn custody_balance(&self) -> Decimal {
        self.assets.balance_of(&self.config.asset, self.custody)
    }

    #[must_use]
    pub fn custody(&self) -> PrincipalId {
        self.custody
    }

    fn shares_for(&self, amount: Decimal, total: Decimal, custody: Decimal) -> Result<Decimal> {
        if total.is_zero() {
            return Ok(self.round(amount));
        }
        if custody.is_zero() {
            return Err(EscrowError::VaultDrained);
        }
        self.ratio(amount, total, custody)
    }

    fn amount_for(&self, shares: Decimal, total: Decimal, custody: Decimal) -> Result<Decimal> {
        // `total` is non-zero here; callers check.
        if custody.is_zero() {
            warn!(asset = %self.config.asset, total_shares = %total, "Vault custody drained");
            return Err(EscrowError::VaultDrained);
        }
        self.ratio(shares, custody, total)
    }

    /// `a × b / c`, rounded toward zero.
    fn ratio(&self, a: Decimal, b: Decimal, c: Decimal) -> Result<Decimal> {
        a.checked_mul(b)
            .and_then(|p| p.checked_div(c))
            .map(|q| self.round(q))
            .ok_or_else(|| EscrowError::BalanceOverflow {
                asset: self.config.asset.clone(),
            })
    }

    fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.config.share_scale, RoundingStrategy::ToZero)
    }
}

fn ensure_positive(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(EscrowError::InvalidAmount {
            reason: format!("{field} must be positive, got {value}"),
        });
    }
    Ok(())
}
