//! Common data types used throughout the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Customer record as returned by the Business Central customers API (v2.0).
///
/// Immutable once fetched; consumed read-only by the orchestrator and the
/// Mailchimp mapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    pub id: String,
    pub number: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub customer_type: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub tax_liable: Option<bool>,
    pub tax_registration_number: Option<String>,
    pub currency_code: Option<String>,
    pub payment_terms_id: Option<String>,
    pub shipment_method_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub blocked: Option<String>,
    pub last_modified_date_time: Option<DateTime<Utc>>,
}

impl Customer {
    /// True only for a non-empty email containing `@`. This is the single
    /// filter applied before attempting an upsert.
    pub fn has_valid_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty() && e.contains('@'))
    }
}

/// Mailchimp member subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Subscribed,
    Unsubscribed,
    Cleaned,
    Pending,
}

/// Merge-field projection of a customer for the Mailchimp member API.
///
/// Every field is always serialized; absent source data becomes the empty
/// string so repeated syncs of the same customer produce byte-identical
/// payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeFields {
    #[serde(rename = "FNAME")]
    pub first_name: String,
    #[serde(rename = "LNAME")]
    pub last_name: String,
    #[serde(rename = "PHONE")]
    pub phone: String,
    #[serde(rename = "COMPANY")]
    pub company: String,
    #[serde(rename = "ADDRESS")]
    pub address: String,
    #[serde(rename = "CITY")]
    pub city: String,
    #[serde(rename = "STATE")]
    pub state: String,
    #[serde(rename = "ZIP")]
    pub zip: String,
    #[serde(rename = "COUNTRY")]
    pub country: String,
    #[serde(rename = "BCID")]
    pub bc_id: String,
    #[serde(rename = "BCNUMBER")]
    pub bc_number: String,
}

/// A single per-record failure captured during a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailure {
    /// Display name of the customer that failed to sync
    pub customer: String,
    /// Formatted error message
    pub message: String,
}

/// Outcome of one sync run. The run as a whole succeeds even when `errors`
/// is non-empty; per-record failures are isolated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Total changed customers detected
    pub total: usize,
    /// Successfully upserted
    pub synced: usize,
    /// Skipped for missing/invalid email
    pub skipped: usize,
    /// Per-record failures
    pub errors: Vec<SyncFailure>,
}

impl SyncSummary {
    /// True when the run detected no changes at all.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
