//! The escrow ledger — open, refund, and settle over per-key slots.
//!
//! Every state-mutating operation runs entirely under its key's slot lock:
//! check preconditions, update the slot, submit one transfer batch, and
//! append the event. If the batch fails the slot is put back exactly as it
//! was, so an operation either fully applies or leaves no trace.
//!
//! Refund and settle both clear the slot before any funds move. Whichever
//! of the two takes the slot lock first wins; the other observes `Absent`.

use chrono::TimeDelta;
use openescrow_types::{
    AbsentSettlePolicy, AssetId, EscrowEntry, EscrowError, EscrowEvent, EscrowKey, EscrowState,
    LedgerConfig, PrincipalId, Result, SettleOutcome, TransferLeg, constants,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::{
    clock::Clock, custody_audit::CustodyAudit, event_log::EventLog, store::EscrowStore,
    transfer::AssetTransfer,
};

/// Two-party conditional escrow ledger.
///
/// `A` moves value, `C` supplies time, `L` receives notifications. The
/// ledger owns the `custody` principal's balances in every asset.
pub struct EscrowLedger<A, C, L> {
    config: LedgerConfig,
    refund_delay: TimeDelta,
    custody: PrincipalId,
    store: EscrowStore,
    assets: A,
    clock: C,
    events: L,
}

impl<A: AssetTransfer, C: Clock, L: EventLog> EscrowLedger<A, C, L> {
    /// Create a ledger whose locked funds are held by `custody`.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate.
    pub fn new(
        config: LedgerConfig,
        custody: PrincipalId,
        assets: A,
        clock: C,
        events: L,
    ) -> Result<Self> {
        config.validate()?;
        let refund_delay = config.refund_delay();
        info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            custody = %custody,
            refund_delay_secs = config.refund_delay_secs,
            absent_settle = ?config.absent_settle,
            "Escrow ledger started"
        );
        Ok(Self {
            config,
            refund_delay,
            custody,
            store: EscrowStore::new(),
            assets,
            clock,
            events,
        })
    }

    /// Look up the escrow `(sender, recipient, locked_asset)`.
    ///
    /// World-readable and side-effect free.
    #[must_use]
    pub fn inspect(
        &self,
        sender: PrincipalId,
        recipient: PrincipalId,
        locked_asset: &AssetId,
    ) -> EscrowState {
        self.store
            .peek(&EscrowKey::new(sender, recipient, locked_asset.clone()))
    }

    /// Lock `locked_amount` of `locked_asset` from `caller` for `recipient`,
    /// redeemable against `counter_amount` of `counter_asset`.
    ///
    /// # Errors
    /// - `InvalidAmount` if either amount is not strictly positive
    /// - `Unauthorized` if `caller` or `recipient` is the custody account
    /// - `AlreadyPending` if the key already holds a live escrow
    /// - `InsufficientFundsOrAllowance` if the pull into custody fails
    pub fn open(
        &self,
        caller: PrincipalId,
        recipient: PrincipalId,
        locked_asset: &AssetId,
        locked_amount: Decimal,
        counter_asset: &AssetId,
        counter_amount: Decimal,
    ) -> Result<EscrowEntry> {
        ensure_positive("locked_amount", locked_amount)?;
        ensure_positive("counter_amount", counter_amount)?;
        if caller == self.custody || recipient == self.custody {
            return Err(EscrowError::Unauthorized {
                reason: "the custody account cannot be a party to an escrow".into(),
            });
        }

        let key = EscrowKey::new(caller, recipient, locked_asset.clone());
        let slot = self.store.slot(&key);
        let mut state = slot.lock();

        if state.is_live() {
            warn!(slot = %key.short(), sender = %caller, "Open rejected: escrow already pending");
            return Err(EscrowError::AlreadyPending { key });
        }

        let entry = EscrowEntry {
            locked_amount,
            counter_asset: counter_asset.clone(),
            counter_amount,
            opened_at: self.clock.now(),
        };

        // Record first, then pull. A failed pull rolls the record back.
        *state = EscrowState::Live(entry.clone());
        if let Err(e) = self
            .assets
            .pull(locked_asset, caller, self.custody, locked_amount)
        {
            *state = EscrowState::Absent;
            warn!(
                slot = %key.short(),
                sender = %caller,
                asset = %locked_asset,
                amount = %locked_amount,
                error = %e,
                "Open rolled back: pull into custody failed"
            );
            return Err(e);
        }

        self.events.append(EscrowEvent::opened(&key, &entry));
        info!(
            slot = %key.short(),
            sender = %caller,
            recipient = %recipient,
            locked_asset = %locked_asset,
            locked_amount = %locked_amount,
            counter_asset = %counter_asset,
            counter_amount = %counter_amount,
            opened_at = %entry.opened_at,
            "Escrow opened"
        );
        Ok(entry)
    }

    /// Return the locked funds of `(caller, recipient, locked_asset)` to
    /// `caller` once the refund delay has passed.
    ///
    /// `sender` must equal `caller` when `strict_refund_sender` is set;
    /// otherwise it is ignored. The key always uses `caller`.
    ///
    /// # Errors
    /// - `Unauthorized` if `sender != caller` under the strict check
    /// - `NoSuchEscrow` if nothing is pending
    /// - `TooEarly` if `now <= opened_at + refund_delay`
    /// - transfer errors from the push out of custody
    pub fn refund(
        &self,
        caller: PrincipalId,
        sender: PrincipalId,
        recipient: PrincipalId,
        locked_asset: &AssetId,
    ) -> Result<EscrowEntry> {
        if self.config.strict_refund_sender && sender != caller {
            warn!(caller = %caller, sender = %sender, "Refund rejected: caller is not the sender");
            return Err(EscrowError::Unauthorized {
                reason: format!("caller {caller} cannot refund on behalf of {sender}"),
            });
        }

        let key = EscrowKey::new(caller, recipient, locked_asset.clone());
        let Some(slot) = self.store.existing(&key) else {
            return Err(EscrowError::NoSuchEscrow { key });
        };
        let mut state = slot.lock();

        let Some(entry) = state.entry().cloned() else {
            debug!(slot = %key.short(), "Refund rejected: nothing pending");
            return Err(EscrowError::NoSuchEscrow { key });
        };

        let now = self.clock.now();
        if !entry.is_refundable(now, self.refund_delay) {
            let unlocks_at = entry.unlocks_at(self.refund_delay);
            debug!(slot = %key.short(), %unlocks_at, %now, "Refund rejected: too early");
            return Err(EscrowError::TooEarly { unlocks_at, now });
        }

        // Clear before moving funds.
        let previous = state.take();
        if let Err(e) = self
            .assets
            .push(locked_asset, self.custody, caller, entry.locked_amount)
        {
            *state = previous;
            warn!(slot = %key.short(), error = %e, "Refund rolled back: push from custody failed");
            return Err(e);
        }

        self.events.append(EscrowEvent::refunded(&key, &entry));
        info!(
            slot = %key.short(),
            sender = %caller,
            recipient = %recipient,
            amount = %entry.locked_amount,
            asset = %locked_asset,
            "Escrow refunded"
        );
        Ok(entry)
    }

    /// As recipient, claim the escrow `(sender, caller, locked_asset)` by
    /// paying its counter amount to `sender`.
    ///
    /// Both legs go to the transfer boundary as one batch, counter leg
    /// first. When nothing is pending the outcome depends on
    /// [`AbsentSettlePolicy`].
    ///
    /// # Errors
    /// - `NoSuchEscrow` on an absent key under [`AbsentSettlePolicy::Reject`]
    /// - `InsufficientFundsOrAllowance` if `caller` cannot pay the counter
    ///   amount; the escrow stays live
    pub fn settle(
        &self,
        caller: PrincipalId,
        sender: PrincipalId,
        locked_asset: &AssetId,
    ) -> Result<SettleOutcome> {
        let key = EscrowKey::new(sender, caller, locked_asset.clone());
        let Some(slot) = self.store.existing(&key) else {
            return self.settle_absent(key);
        };
        let mut state = slot.lock();

        // Clear before moving funds.
        let EscrowState::Live(entry) = state.take() else {
            return self.settle_absent(key);
        };

        let legs = [
            TransferLeg::new(
                entry.counter_asset.clone(),
                caller,
                sender,
                entry.counter_amount,
            ),
            TransferLeg::new(
                locked_asset.clone(),
                self.custody,
                caller,
                entry.locked_amount,
            ),
        ];
        if let Err(e) = self.assets.execute(&legs) {
            warn!(
                slot = %key.short(),
                recipient = %caller,
                error = %e,
                "Settle rolled back: transfer batch failed"
            );
            *state = EscrowState::Live(entry);
            return Err(e);
        }

        self.events.append(EscrowEvent::executed(&key, &entry));
        info!(
            slot = %key.short(),
            sender = %sender,
            recipient = %caller,
            locked_asset = %locked_asset,
            locked_amount = %entry.locked_amount,
            counter_asset = %entry.counter_asset,
            counter_amount = %entry.counter_amount,
            "Escrow executed"
        );
        Ok(SettleOutcome::Executed(entry))
    }

    fn settle_absent(&self, key: EscrowKey) -> Result<SettleOutcome> {
        match self.config.absent_settle {
            AbsentSettlePolicy::NoOp => {
                debug!(slot = %key.short(), "Settle on absent escrow: nothing to do");
                Ok(SettleOutcome::NothingPending)
            }
            AbsentSettlePolicy::Reject => {
                debug!(slot = %key.short(), "Settle rejected: nothing pending");
                Err(EscrowError::NoSuchEscrow { key })
            }
        }
    }

    /// Check that custody holds exactly the sum of live locked amounts for
    /// `asset`. Only meaningful while no operation is in flight.
    ///
    /// # Errors
    /// `CustodyInvariantViolation` if the balances disagree.
    pub fn verify_custody(&self, asset: &AssetId) -> Result<()> {
        let entries = self.store.live_entries();
        let audit = CustodyAudit::from_entries(&entries);
        let actual = self.assets.balance_of(asset, self.custody);
        audit.verify(asset, actual).inspect_err(|e| {
            error!(asset = %asset, custody = %actual, error = %e, "Custody invariant violated");
        })
    }

    /// Drop idle absent slots. Returns how many were removed.
    ///
    /// Every key ever opened keeps a slot, including keys whose `open`
    /// failed, until this runs. Long-lived hosts should call it
    /// periodically.
    pub fn compact(&self) -> usize {
        let removed = self.store.compact();
        debug!(removed, "Escrow store compacted");
        removed
    }

    /// Number of live escrows.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    /// Principal that holds locked funds.
    #[must_use]
    pub fn custody(&self) -> PrincipalId {
        self.custody
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The transfer boundary this ledger drives.
    #[must_use]
    pub fn assets(&self) -> &A {
        &self.assets
    }
}

fn ensure_positive(field: &str, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(EscrowError::InvalidAmount {
            reason: format!("{field} must be positive, got {amount}"),
        });
    }
    Ok(())
}
