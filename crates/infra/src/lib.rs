//! # bcsync Infrastructure
//!
//! Infrastructure implementations of the core sync ports.
//!
//! This crate contains:
//! - HTTP client wrapper (timeout + bounded retry)
//! - Entra (Azure AD) token provider with caching
//! - Business Central delta-query client
//! - Mailchimp audience client
//! - Checkpoint stores
//! - Configuration loader and the cron scheduler
//!
//! ## Architecture
//! - Implements traits defined in `bcsync-core`
//! - Contains all "impure" code (network I/O, environment access)

pub mod auth;
pub mod checkpoint;
pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use auth::EntraTokenProvider;
pub use checkpoint::{EnvCheckpointStore, InMemoryCheckpointStore};
pub use http::HttpClient;
pub use integrations::bc::{AccessTokenProvider, BcClient};
pub use integrations::mailchimp::MailchimpClient;
pub use scheduling::{CustomerSyncScheduler, SyncSchedulerConfig};
