//! Transfer legs handed to the asset-transfer boundary.
//!
//! The ledger never moves value itself. It describes each movement as a
//! [`TransferLeg`] and submits one batch per operation; the boundary
//! applies the whole batch or none of it.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AssetId, PrincipalId};

/// Move `amount` of `asset` from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    pub asset: AssetId,
    pub from: PrincipalId,
    pub to: PrincipalId,
    pub amount: Decimal,
}

impl TransferLeg {
    #[must_use]
    pub fn new(asset: AssetId, from: PrincipalId, to: PrincipalId, amount: Decimal) -> Self {
        Self {
            asset,
            from,
            to,
            amount,
        }
    }

    /// A leg that moves nothing. Boundaries skip these.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.amount.is_zero() || self.from == self.to
    }
}

impl fmt::Display for TransferLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}->{}",
            self.amount, self.asset, self.from, self.to
        )
    }
}
