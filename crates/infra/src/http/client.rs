use std::time::Duration;

use bcsync_domain::{Result, SyncError};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Settings for the outbound HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    /// Total attempts per request (initial try plus retries).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each one.
    pub base_backoff: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
        }
    }
}

/// Shared outbound HTTP client.
///
/// Both API integrations route their calls through here. Transport failures
/// and 5xx responses are retried a bounded number of times with doubling
/// backoff; 4xx responses are never retried. Callers that treat any non-2xx
/// status as a failure use [`HttpClient::send_checked`], which consumes the
/// response body into `SyncError::Api`.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    settings: HttpSettings,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_settings(HttpSettings::default())
    }

    pub fn with_settings(settings: HttpSettings) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(settings.timeout)
            .no_proxy()
            .build()
            .map_err(|err| SyncError::from(InfraError::from(err)))?;

        Ok(Self { client, settings })
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send the request, retrying transport failures and server errors.
    /// The final response is returned whatever its status.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut attempt: u32 = 1;
        let mut delay = self.settings.base_backoff;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    SyncError::Internal("request body must be cloneable for retries".into())
                })?
                .build()
                .map_err(|err| SyncError::from(InfraError::from(err)))?;

            debug!(attempt, method = %request.method(), url = %request.url(), "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response)
                    if response.status().is_server_error()
                        && attempt < self.settings.max_attempts =>
                {
                    warn!(attempt, status = %response.status(), "server error, retrying");
                }
                Ok(response) => return Ok(response),
                Err(err) if is_transient(&err) && attempt < self.settings.max_attempts => {
                    warn!(attempt, error = %err, "transport failure, retrying");
                }
                Err(err) => return Err(SyncError::from(InfraError::from(err))),
            }

            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
            attempt += 1;
        }
    }

    /// Like [`HttpClient::send`], but any non-2xx response becomes
    /// `SyncError::Api` carrying the status and response body.
    pub async fn send_checked(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
        Err(SyncError::Api { status: status.as_u16(), body })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
