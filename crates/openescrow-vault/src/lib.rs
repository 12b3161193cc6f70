//! # openescrow-vault
//!
//! **Share Vault**: single-asset deposit/withdraw pool that issues shares
//! proportional to each depositor's contribution.
//!
//! The vault moves funds through the same [`AssetTransfer`] boundary as the
//! escrow ledger and holds them under its own custody principal. Shares
//! round toward zero, so the vault never owes more than it holds.
//!
//! [`AssetTransfer`]: openescrow_ledger::AssetTransfer

pub mod vault;

pub use vault::ShareVault;
