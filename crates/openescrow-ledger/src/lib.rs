//! # openescrow-ledger
//!
//! **Escrow Ledger**: a timeout-guarded conditional escrow between two
//! principals.
//!
//! ## Architecture
//!
//! 1. **EscrowStore**: one lock per `(sender, recipient, locked_asset)` key
//! 2. **AssetTransfer**: all-or-nothing transfer batches (external boundary);
//!    [`InMemoryAssetBook`] implements it in-process
//! 3. **Clock**: injected time source ([`SystemClock`], [`ManualClock`])
//! 4. **EventLog**: best-effort notifications ([`MemoryEventLog`],
//!    [`TracingEventLog`], [`NullEventLog`])
//! 5. **CustodyAudit**: checks custody against live escrows
//!
//! ## Operation Flow
//!
//! ```text
//! open   (sender)    → record entry → pull locked → Opened
//! refund (sender)    → delay passed? → clear → push locked back → Refunded
//! settle (recipient) → clear → [counter → sender, locked → recipient] → Executed
//! ```
//!
//! Every operation holds its key's lock from precondition check to event,
//! and restores the slot if the transfer batch fails.

pub mod asset_book;
pub mod clock;
pub mod custody_audit;
pub mod event_log;
pub mod ledger;
pub mod store;
pub mod telemetry;
pub mod transfer;

pub use asset_book::InMemoryAssetBook;
pub use clock::{Clock, ManualClock, SystemClock};
pub use custody_audit::CustodyAudit;
pub use event_log::{EventLog, MemoryEventLog, NullEventLog, TracingEventLog};
pub use ledger::EscrowLedger;
pub use store::EscrowStore;
pub use telemetry::LogFormat;
pub use transfer::AssetTransfer;
