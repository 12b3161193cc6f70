//! Vault flows over a shared asset book.
//!
//! The vault and an escrow ledger hold funds under separate custody
//! principals in the same book; neither may disturb the other. A seeded
//! walk of deposits, withdrawals and yield checks that the vault can
//! always honor every outstanding share.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use openescrow_ledger::{
    AssetTransfer, EscrowLedger, InMemoryAssetBook, ManualClock, NullEventLog,
};
use openescrow_types::*;
use openescrow_vault::ShareVault;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn vault_over(book: &Arc<InMemoryAssetBook>, asset: &AssetId) -> ShareVault<Arc<InMemoryAssetBook>> {
    ShareVault::new(
        VaultConfig::new(asset.clone()),
        PrincipalId::new(),
        Arc::clone(book),
    )
}

// =============================================================================
// Two depositors share yield pro rata
// =============================================================================
#[test]
fn yield_is_shared_pro_rata() {
    let book = Arc::new(InMemoryAssetBook::new());
    let usd = AssetId::new("USD");
    let vault = vault_over(&book, &usd);
    let (alice, bob) = (PrincipalId::new(), PrincipalId::new());
    book.deposit(alice, &usd, dec(300)).unwrap();
    book.deposit(bob, &usd, dec(100)).unwrap();

    vault.deposit(alice, dec(300)).unwrap();
    vault.deposit(bob, dec(100)).unwrap();
    assert_eq!(vault.total_shares(), dec(400));

    // 20% yield lands in custody.
    book.deposit(vault.custody(), &usd, dec(80)).unwrap();

    let a_out = vault.withdraw(alice, vault.shares_of(alice)).unwrap();
    let b_out = vault.withdraw(bob, vault.shares_of(bob)).unwrap();
    assert_eq!(a_out, dec(360));
    assert_eq!(b_out, dec(120));
    assert_eq!(vault.custody_balance(), Decimal::ZERO);
    assert_eq!(vault.total_shares(), Decimal::ZERO);
}

// =============================================================================
// Vault and escrow ledger coexist on one book
// =============================================================================
#[test]
fn vault_and_ledger_custody_are_independent() {
    let book = Arc::new(InMemoryAssetBook::new());
    let x = AssetId::new("X");
    let y = AssetId::new("Y");
    let ledger = EscrowLedger::new(
        LedgerConfig::default(),
        PrincipalId::new(),
        Arc::clone(&book),
        Arc::new(ManualClock::new(Utc::now())),
        NullEventLog,
    )
    .unwrap();
    let vault = vault_over(&book, &x);

    let (s, r) = (PrincipalId::new(), PrincipalId::new());
    book.deposit(s, &x, dec(500)).unwrap();
    book.deposit(r, &y, dec(50)).unwrap();

    vault.deposit(s, dec(200)).unwrap();
    ledger.open(s, r, &x, dec(100), &y, dec(50)).unwrap();

    assert_eq!(vault.custody_balance(), dec(200));
    assert_eq!(book.balance_of(&x, ledger.custody()), dec(100));
    ledger.verify_custody(&x).unwrap();

    ledger.settle(r, s, &x).unwrap();
    assert_eq!(vault.custody_balance(), dec(200));
    assert_eq!(vault.withdraw(s, dec(200)).unwrap(), dec(200));
    assert_eq!(book.balance_of(&x, s), dec(400));
    assert_eq!(book.balance_of(&x, r), dec(100));
    assert_eq!(book.total_supply(&x), dec(500));
}

// =============================================================================
// Seeded walk: the vault stays solvent
// =============================================================================
#[test]
fn random_walk_stays_solvent() {
    let book = Arc::new(InMemoryAssetBook::new());
    let usd = AssetId::new("USD");
    let vault = vault_over(&book, &usd);
    let mut rng = StdRng::seed_from_u64(0x5a_0017);

    let holders: Vec<PrincipalId> = (0..5).map(|_| PrincipalId::new()).collect();
    for h in &holders {
        book.deposit(*h, &usd, dec(10_000)).unwrap();
    }
    let mut shares: HashMap<PrincipalId, Decimal> = HashMap::new();

    for _ in 0..1_000 {
        let who = holders[rng.gen_range(0..holders.len())];
        match rng.gen_range(0..5) {
            0 | 1 => {
                let amount = Decimal::new(rng.gen_range(1..50_000), 2);
                if book.balance_of(&usd, who) >= amount {
                    match vault.deposit(who, amount) {
                        Ok(minted) => *shares.entry(who).or_insert(Decimal::ZERO) += minted,
                        // Price per share can outgrow a cent-sized deposit.
                        Err(EscrowError::InvalidAmount { .. }) => {}
                        Err(e) => panic!("unexpected deposit error: {e}"),
                    }
                }
            }
            2 | 3 => {
                let held = shares.get(&who).copied().unwrap_or(Decimal::ZERO);
                if held > Decimal::ZERO {
                    let burn = (held / dec(rng.gen_range(1..4))).round_dp(8).min(held);
                    if burn > Decimal::ZERO {
                        vault.withdraw(who, burn).unwrap();
                        *shares.entry(who).or_insert(Decimal::ZERO) -= burn;
                    }
                }
            }
            _ => {
                let gain = Decimal::new(rng.gen_range(1..1_000), 2);
                book.deposit(vault.custody(), &usd, gain).unwrap();
            }
        }

        for h in &holders {
            assert_eq!(
                vault.shares_of(*h),
                shares.get(h).copied().unwrap_or(Decimal::ZERO)
            );
        }
        let total: Decimal = shares.values().copied().sum();
        assert_eq!(vault.total_shares(), total);

        // Every holder could exit at the current price without overdrawing.
        if total > Decimal::ZERO {
            let owed: Decimal = shares
                .values()
                .filter(|s| !s.is_zero())
                .map(|s| vault.preview_withdraw(*s).unwrap())
                .sum();
            assert!(owed <= vault.custody_balance(), "{owed} > custody");
        }
    }
}
