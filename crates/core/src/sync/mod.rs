//! Customer sync orchestration

pub mod ports;
pub mod service;

pub use ports::{CheckpointStore, ContactStore, CustomerSource};
pub use service::CustomerSyncService;
