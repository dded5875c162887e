//! Client for the Business Central customers API
//!
//! Change detection relies on the `lastModifiedDateTime` field: each fetch
//! filters on records modified after the previous checkpoint, widened by a
//! fixed overlap so records committed while the previous run was in flight
//! are not lost. The upsert on the receiving side makes re-reads harmless.

use async_trait::async_trait;
use bcsync_domain::constants::checkpoint_overlap;
use bcsync_domain::{BcConfig, Customer, Result, SyncError};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::HttpClient;
use bcsync_core::sync::CustomerSource;

const BC_API_BASE: &str = "https://api.businesscentral.dynamics.com/v2.0";

/// Supplies bearer tokens for outbound API calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Business Central customers API client.
pub struct BcClient {
    base_url: String,
    http: HttpClient,
    tokens: std::sync::Arc<dyn AccessTokenProvider>,
}

impl BcClient {
    pub fn new(config: &BcConfig, tokens: std::sync::Arc<dyn AccessTokenProvider>) -> Result<Self> {
        let base_url = format!(
            "{BC_API_BASE}/{}/{}/api/v2.0/companies({})",
            config.tenant_id, config.environment, config.company_id
        );
        Self::with_base_url(base_url, tokens)
    }

    /// Create a client against an explicit base URL (for testing).
    pub fn with_base_url(
        base_url: String,
        tokens: std::sync::Arc<dyn AccessTokenProvider>,
    ) -> Result<Self> {
        let http = HttpClient::new()?;
        Ok(Self { base_url, http, tokens })
    }

    /// Fetch every customer in the company, unfiltered.
    pub async fn all_customers(&self) -> Result<Vec<Customer>> {
        self.fetch_customers(None).await
    }

    /// OData filter matching records modified after `since`, widened
    /// backwards by the checkpoint overlap.
    fn delta_filter(since: DateTime<Utc>) -> String {
        let lower_bound = since - checkpoint_overlap();
        format!(
            "lastModifiedDateTime gt {}",
            lower_bound.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }

    async fn fetch_customers(&self, filter: Option<String>) -> Result<Vec<Customer>> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/customers", self.base_url);

        let mut request = self.http.request(Method::GET, &url).bearer_auth(token);
        if let Some(filter) = &filter {
            debug!(%filter, "fetching customers with delta filter");
            request = request.query(&[("$filter", filter)]);
        } else {
            debug!("fetching all customers");
        }

        let response = self.http.send_checked(request).await?;
        let payload: CustomersResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Internal(format!("invalid customers payload: {e}")))?;

        info!(count = payload.value.len(), "fetched customers");
        Ok(payload.value)
    }
}

#[async_trait]
impl CustomerSource for BcClient {
    async fn changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Customer>> {
        self.fetch_customers(since.map(Self::delta_filter)).await
    }
}

#[derive(Debug, Deserialize)]
struct CustomersResponse {
    #[serde(default)]
    value: Vec<Customer>,
}
