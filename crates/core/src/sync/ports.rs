//! Port interfaces for the customer sync

use async_trait::async_trait;
use bcsync_domain::{Customer, Result};
use chrono::{DateTime, Utc};

/// Source of changed customer records (the ERP side).
#[async_trait]
pub trait CustomerSource: Send + Sync {
    /// Fetch customers modified since the given checkpoint. `None` means no
    /// prior checkpoint exists and the full customer list is returned.
    ///
    /// Implementations apply the backward overlap window to the filter; the
    /// caller passes the checkpoint unmodified.
    async fn changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Customer>>;
}

/// Destination audience for contacts (the marketing side).
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Create-or-update the contact derived from this customer, keyed by the
    /// normalized email. Fails with `SyncError::Validation` when the
    /// customer has no email.
    async fn upsert_contact(&self, customer: &Customer) -> Result<()>;

    /// Permanently delete the contact with this email.
    async fn delete_contact(&self, email: &str) -> Result<()>;

    /// Activate the given tags on the contact with this email.
    async fn tag_contact(&self, email: &str, tags: &[String]) -> Result<()>;
}

/// Storage for the last successful delta-fetch timestamp.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint, or `None` when no prior run recorded one.
    async fn load(&self) -> Result<Option<DateTime<Utc>>>;

    /// Overwrite the checkpoint.
    async fn save(&self, checkpoint: DateTime<Utc>) -> Result<()>;

    /// Discard the checkpoint so the next run performs a full fetch.
    async fn reset(&self) -> Result<()>;
}
