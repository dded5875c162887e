//! Configuration structures
//!
//! Loaded by `bcsync-infra::config` from environment variables or a config
//! file; see the loader for the environment names.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHECKPOINT_KEY, DEFAULT_SYNC_CRON};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bc: BcConfig,
    pub mailchimp: MailchimpConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Business Central connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BcConfig {
    /// Entra (Azure AD) tenant id
    pub tenant_id: String,
    /// BC environment name, e.g. "production" or "sandbox"
    pub environment: String,
    /// BC company id (GUID)
    pub company_id: String,
    /// App registration client id; required unless managed identity is used
    #[serde(default)]
    pub client_id: Option<String>,
    /// App registration client secret; required unless managed identity is used
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Acquire tokens via the Azure managed identity endpoint instead of
    /// client credentials
    #[serde(default)]
    pub use_managed_identity: bool,
}

/// Mailchimp audience settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailchimpConfig {
    pub api_key: String,
    /// Data-center prefix, e.g. "us1"
    pub server_prefix: String,
    /// Audience (list) id
    pub list_id: String,
}

/// Sync loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Cron expression for the sync schedule
    #[serde(default = "default_cron")]
    pub cron: String,
    /// Environment variable used to persist the checkpoint
    #[serde(default = "default_checkpoint_key")]
    pub checkpoint_key: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { cron: default_cron(), checkpoint_key: default_checkpoint_key() }
    }
}

fn default_cron() -> String {
    DEFAULT_SYNC_CRON.to_string()
}

fn default_checkpoint_key() -> String {
    DEFAULT_CHECKPOINT_KEY.to_string()
}
