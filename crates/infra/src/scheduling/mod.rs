//! Scheduling infrastructure
//!
//! Cron-driven execution of the customer sync with explicit lifecycle
//! management: join handles are tracked, cancellation is explicit, and every
//! asynchronous operation is wrapped in a timeout.

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{CustomerSyncScheduler, SyncSchedulerConfig};
