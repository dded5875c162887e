//! Entra (Azure AD) token provider with caching
//!
//! Acquires bearer tokens for the Business Central API using either the
//! client-credentials flow or the Azure managed-identity endpoint, selected
//! by configuration. Tokens are cached for their lifetime minus a safety
//! buffer; `clear_cache` forces the next call to refresh.
//!
//! There is no de-duplication of concurrent refreshes: the cache lock is
//! not held across the network call, so overlapping callers during a
//! refresh may each hit the identity provider. The provider is idempotent
//! and cheap, so this is accepted.

use async_trait::async_trait;
use bcsync_domain::constants::{DEFAULT_TOKEN_TTL_SECS, TOKEN_EXPIRY_BUFFER_SECS};
use bcsync_domain::{BcConfig, Result, SyncError};
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::http::{HttpClient, HttpSettings};
use crate::integrations::bc::AccessTokenProvider;

const BC_SCOPE: &str = "https://api.businesscentral.dynamics.com/.default";
const BC_RESOURCE: &str = "https://api.businesscentral.dynamics.com";
const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const TOKEN_REQUEST_TIMEOUT_SECS: u64 = 10;

/// A token together with its computed expiry instant.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Valid only while the expiry lies beyond the safety buffer.
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS) < self.expires_at
    }
}

/// Cached Entra token provider for the Business Central API.
pub struct EntraTokenProvider {
    config: BcConfig,
    authority: String,
    imds_endpoint: String,
    http: HttpClient,
    cache: Mutex<Option<CachedToken>>,
}

impl EntraTokenProvider {
    /// Create a provider against the public Microsoft endpoints.
    pub fn new(config: BcConfig) -> Result<Self> {
        Self::with_endpoints(config, DEFAULT_AUTHORITY.to_string(), IMDS_TOKEN_ENDPOINT.to_string())
    }

    /// Create a provider with custom endpoint bases (for testing).
    pub fn with_endpoints(
        config: BcConfig,
        authority: String,
        imds_endpoint: String,
    ) -> Result<Self> {
        let http = HttpClient::with_settings(HttpSettings {
            timeout: std::time::Duration::from_secs(TOKEN_REQUEST_TIMEOUT_SECS),
            ..HttpSettings::default()
        })?;

        Ok(Self { config, authority, imds_endpoint, http, cache: Mutex::new(None) })
    }

    /// Return a bearer token, refreshing when the cached one is missing or
    /// inside the expiry buffer.
    pub async fn get_access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await {
            debug!("using cached access token");
            return Ok(token);
        }

        let fresh = if self.config.use_managed_identity {
            self.request_managed_identity_token().await?
        } else {
            self.request_client_credentials_token().await?
        };

        let token = fresh.access_token.clone();
        *self.cache.lock().await = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn clear_cache(&self) {
        *self.cache.lock().await = None;
    }

    async fn cached_token(&self) -> Option<String> {
        let cache = self.cache.lock().await;
        cache.as_ref().filter(|t| t.is_fresh(Utc::now())).map(|t| t.access_token.clone())
    }

    async fn request_client_credentials_token(&self) -> Result<CachedToken> {
        let (client_id, client_secret) = match (&self.config.client_id, &self.config.client_secret)
        {
            (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
            _ => {
                return Err(SyncError::Config(
                    "missing Entra credentials: BC_CLIENT_ID and BC_CLIENT_SECRET are required \
                     unless USE_MANAGED_IDENTITY is enabled"
                        .into(),
                ))
            }
        };

        let url = format!("{}/{}/oauth2/v2.0/token", self.authority, self.config.tenant_id);
        debug!("acquiring token via client credentials");

        let request = self.http.request(Method::POST, &url).form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("scope", BC_SCOPE),
            ("grant_type", "client_credentials"),
        ]);

        let response = self.http.send(request).await?;
        self.parse_token_response(response, "client credentials").await
    }

    async fn request_managed_identity_token(&self) -> Result<CachedToken> {
        debug!("acquiring token via managed identity");

        let request = self
            .http
            .request(Method::GET, &self.imds_endpoint)
            .query(&[("api-version", IMDS_API_VERSION), ("resource", BC_RESOURCE)])
            .header("Metadata", "true");

        let response = self.http.send(request).await?;
        self.parse_token_response(response, "managed identity").await
    }

    async fn parse_token_response(
        &self,
        response: reqwest::Response,
        flow: &str,
    ) -> Result<CachedToken> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(SyncError::Auth(format!(
                "{flow} token request rejected (HTTP {}): {body}",
                status.as_u16()
            )));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Auth(format!("failed to parse {flow} token response: {e}")))?;

        let ttl = payload
            .expires_in
            .as_ref()
            .and_then(ExpiresIn::seconds)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let expires_at = Utc::now() + Duration::seconds(ttl);

        info!(flow, %expires_at, "acquired access token");

        Ok(CachedToken { access_token: payload.access_token, expires_at })
    }
}

#[async_trait]
impl AccessTokenProvider for EntraTokenProvider {
    async fn access_token(&self) -> Result<String> {
        self.get_access_token().await
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<ExpiresIn>,
}

/// The AAD endpoint returns `expires_in` as a number; the IMDS endpoint
/// returns it as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(i64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Option<i64> {
        match self {
            Self::Seconds(s) => Some(*s),
            Self::Text(t) => t.parse().ok(),
        }
    }
}
