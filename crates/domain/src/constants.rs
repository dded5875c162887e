//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

use chrono::Duration;

/// Safety buffer before token expiry; a cached token inside this window is
/// treated as expired and refreshed.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300;

/// Fallback token lifetime when the identity provider omits `expires_in`.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Backward overlap applied to the delta filter lower bound. Compensates
/// clock skew between Business Central write timestamps and our poll time;
/// duplicate boundary deliveries are absorbed by the idempotent upsert.
pub const CHECKPOINT_OVERLAP_SECS: i64 = 60;

/// Default schedule: every 5 minutes.
pub const DEFAULT_SYNC_CRON: &str = "0 */5 * * * *";

/// Environment variable holding the last-check checkpoint by default.
pub const DEFAULT_CHECKPOINT_KEY: &str = "BC_CUSTOMERS_LAST_CHECK_TIME";

/// Overlap window as a `chrono::Duration`.
pub fn checkpoint_overlap() -> Duration {
    Duration::seconds(CHECKPOINT_OVERLAP_SECS)
}
