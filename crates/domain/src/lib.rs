//! # bcsync Domain
//!
//! Business domain types and models for the Business Central → Mailchimp
//! customer sync.
//!
//! This crate contains:
//! - Domain data types (Customer, MergeFields, SyncSummary, ...)
//! - Domain error types and Result definitions
//! - Domain constants
//! - Pure helpers (display-name splitting)
//!
//! ## Architecture
//! - No dependencies on other bcsync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::name::split_display_name;
