//! System-wide constants for OpenEscrow.

/// Seconds after `opened_at` before the sender may refund (7 days).
pub const REFUND_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

/// Default decimal places kept when minting or redeeming vault shares.
pub const DEFAULT_SHARE_SCALE: u32 = 8;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenEscrow";
