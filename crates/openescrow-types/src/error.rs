//! Error types for the OpenEscrow ledger.
//!
//! All errors use the `OE_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Escrow state errors
//! - 2xx: Asset transfer errors
//! - 3xx: Authorization errors
//! - 4xx: Vault errors
//! - 8xx: Safety invariant errors
//! - 9xx: Serialization and configuration errors

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AssetId, EscrowKey};

/// Central error enum for all OpenEscrow operations.
#[derive(Debug, Error)]
pub enum EscrowError {
    // =================================================================
    // Escrow State Errors (1xx)
    // =================================================================
    /// `open` on a key that already holds a live escrow.
    #[error("OE_ERR_100: Escrow already pending: {key}")]
    AlreadyPending { key: EscrowKey },

    /// `refund` (or strict `settle`) on a key with nothing pending.
    #[error("OE_ERR_101: No such escrow: {key}")]
    NoSuchEscrow { key: EscrowKey },

    /// `refund` before the refund delay has elapsed.
    #[error("OE_ERR_102: Refund too early: unlocks after {unlocks_at}, now {now}")]
    TooEarly {
        unlocks_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// Zero or negative amount supplied where a positive one is required.
    #[error("OE_ERR_103: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Asset Transfer Errors (2xx)
    // =================================================================
    /// The source of a transfer cannot cover it.
    #[error("OE_ERR_200: Insufficient funds or allowance for {asset}: need {needed}, have {available}")]
    InsufficientFundsOrAllowance {
        asset: AssetId,
        needed: Decimal,
        available: Decimal,
    },

    /// Crediting a balance would exceed the representable range.
    #[error("OE_ERR_201: Balance overflow for {asset}")]
    BalanceOverflow { asset: AssetId },

    // =================================================================
    // Authorization Errors (3xx)
    // =================================================================
    /// The caller is not permitted to act on this escrow.
    #[error("OE_ERR_300: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    // =================================================================
    // Vault Errors (4xx)
    // =================================================================
    /// `withdraw` while no shares exist.
    #[error("OE_ERR_400: No vault shares outstanding")]
    NoSharesOutstanding,

    /// `withdraw` of more shares than the caller holds.
    #[error("OE_ERR_401: Insufficient shares: need {needed}, have {available}")]
    InsufficientShares { needed: Decimal, available: Decimal },

    /// Shares are outstanding but the vault holds nothing to price them.
    #[error("OE_ERR_402: Vault custody drained while shares are outstanding")]
    VaultDrained,

    // =================================================================
    // Safety Errors (8xx)
    // =================================================================
    /// Custody balance disagrees with the sum of live escrows.
    #[error("OE_ERR_800: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    // =================================================================
    // General (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("OE_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("OE_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

impl From<serde_json::Error> for EscrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
