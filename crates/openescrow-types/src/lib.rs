//! # openescrow-types
//!
//! Shared types, errors, and configuration for the **OpenEscrow** ledger.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PrincipalId`], [`AssetId`]
//! - **Escrow model**: [`EscrowKey`], [`EscrowEntry`], [`EscrowState`], [`SettleOutcome`]
//! - **Transfers**: [`TransferLeg`]
//! - **Events**: [`EscrowEvent`], [`EventKind`], [`EventRecord`]
//! - **Configuration**: [`LedgerConfig`], [`AbsentSettlePolicy`], [`VaultConfig`]
//! - **Errors**: [`EscrowError`] with `OE_ERR_` prefix codes
//! - **Constants**: refund delay and other defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod event;
pub mod ids;
pub mod transfer;

// Re-export all primary types at crate root for ergonomic imports:
//   use openescrow_types::{EscrowKey, EscrowEntry, EscrowError, ...};

pub use config::*;
pub use error::*;
pub use escrow::*;
pub use event::*;
pub use ids::*;
pub use transfer::*;

// Constants are accessed via `openescrow_types::constants::FOO`
// (not re-exported to avoid name collisions).
