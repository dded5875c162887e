//! # bcsync Core
//!
//! Core business logic for the customer sync: port traits and the
//! orchestration service.
//!
//! This crate contains:
//! - Port interfaces implemented by `bcsync-infra` (customer source,
//!   contact store, checkpoint store)
//! - The sync orchestrator (`CustomerSyncService`)
//!
//! ## Architecture
//! - Depends only on `bcsync-domain`
//! - No I/O of its own; everything behind ports so the orchestration can be
//!   tested with fakes

pub mod sync;

// Re-export commonly used items
pub use sync::ports::{CheckpointStore, ContactStore, CustomerSource};
pub use sync::service::CustomerSyncService;
