//! Client for the Mailchimp marketing API (v3)
//!
//! All member operations address the list member by subscriber hash, so the
//! upsert PUT is idempotent and re-processing a customer after a checkpoint
//! overlap converges to the same list state.

use async_trait::async_trait;
use bcsync_domain::{Customer, MailchimpConfig, MergeFields, Result, SubscriptionStatus, SyncError};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};

use crate::http::HttpClient;
use crate::integrations::mailchimp::map::{merge_fields, subscriber_hash};
use bcsync_core::sync::ContactStore;

/// Mailchimp audience client.
pub struct MailchimpClient {
    base_url: String,
    api_key: String,
    list_id: String,
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct MemberUpsert<'a> {
    email_address: &'a str,
    status_if_new: SubscriptionStatus,
    merge_fields: MergeFields,
}

#[derive(Debug, Serialize)]
struct TagUpdate<'a> {
    tags: Vec<Tag<'a>>,
}

#[derive(Debug, Serialize)]
struct Tag<'a> {
    name: &'a str,
    status: &'a str,
}

impl MailchimpClient {
    pub fn new(config: &MailchimpConfig) -> Result<Self> {
        let base_url = format!("https://{}.api.mailchimp.com/3.0", config.server_prefix);
        Self::with_base_url(base_url, config)
    }

    /// Create a client against an explicit base URL (for testing).
    pub fn with_base_url(base_url: String, config: &MailchimpConfig) -> Result<Self> {
        let http = HttpClient::new()?;
        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            list_id: config.list_id.clone(),
            http,
        })
    }

    fn member_url(&self, email: &str) -> String {
        format!("{}/lists/{}/members/{}", self.base_url, self.list_id, subscriber_hash(email))
    }

    /// Run a member request, prefixing API failures with the operation name.
    async fn execute(&self, request: reqwest::RequestBuilder, context: &str) -> Result<()> {
        self.http.send_checked(request).await.map_err(|err| match err {
            SyncError::Api { status, body } => {
                SyncError::Api { status, body: format!("{context}: {body}") }
            }
            other => other,
        })?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MailchimpClient {
    /// Create-or-update the list member for this customer. New members are
    /// created as subscribed; existing members keep their current status.
    async fn upsert_contact(&self, customer: &Customer) -> Result<()> {
        let email = customer
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| SyncError::Validation("customer has no email address".into()))?;

        let payload = MemberUpsert {
            email_address: email,
            status_if_new: SubscriptionStatus::Subscribed,
            merge_fields: merge_fields(customer),
        };

        debug!(customer = %customer.display_name, "upserting list member");

        let request = self
            .http
            .request(Method::PUT, self.member_url(email))
            .basic_auth("anystring", Some(&self.api_key))
            .json(&payload);

        self.execute(request, "member upsert failed").await?;
        info!(customer = %customer.display_name, "upserted list member");
        Ok(())
    }

    /// Permanently delete a member from the audience.
    async fn delete_contact(&self, email: &str) -> Result<()> {
        let url = format!("{}/actions/delete-permanent", self.member_url(email));
        let request =
            self.http.request(Method::POST, url).basic_auth("anystring", Some(&self.api_key));

        self.execute(request, "member delete failed").await
    }

    /// Mark the given tags active on an existing member.
    async fn tag_contact(&self, email: &str, tags: &[String]) -> Result<()> {
        let payload = TagUpdate {
            tags: tags.iter().map(|name| Tag { name, status: "active" }).collect(),
        };

        let url = format!("{}/tags", self.member_url(email));
        let request = self
            .http
            .request(Method::POST, url)
            .basic_auth("anystring", Some(&self.api_key))
            .json(&payload);

        self.execute(request, "tag update failed").await
    }
}
