//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `BC_TENANT_ID`: Entra tenant id (required)
//! - `BC_ENVIRONMENT`: Business Central environment name (default
//!   `production`)
//! - `BC_COMPANY_ID`: Business Central company id (required)
//! - `BC_CLIENT_ID` / `BC_CLIENT_SECRET`: app registration credentials
//! - `USE_MANAGED_IDENTITY`: acquire tokens via managed identity (true/false)
//! - `MAILCHIMP_API_KEY`: Mailchimp API key (required)
//! - `MAILCHIMP_SERVER_PREFIX`: data-center prefix, e.g. `us1` (required)
//! - `MAILCHIMP_LIST_ID`: audience id (required)
//! - `BCSYNC_CRON`: sync schedule override
//! - `BCSYNC_CHECKPOINT_KEY`: checkpoint environment variable override
//!
//! ## File Locations
//! When the environment is incomplete the loader probes `config.{json,toml}`
//! and `bcsync.{json,toml}` in the working directory, its two parents, and
//! next to the executable.

use std::path::{Path, PathBuf};

use bcsync_domain::{
    AppConfig, BcConfig, MailchimpConfig, Result, SyncError, SyncSettings,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SyncError::Config` if configuration cannot be loaded from either
/// source.
pub fn load() -> Result<AppConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `SyncError::Config` if required variables are missing.
pub fn load_from_env() -> Result<AppConfig> {
    let bc = BcConfig {
        tenant_id: env_var("BC_TENANT_ID")?,
        environment: std::env::var("BC_ENVIRONMENT").unwrap_or_else(|_| "production".to_string()),
        company_id: env_var("BC_COMPANY_ID")?,
        client_id: std::env::var("BC_CLIENT_ID").ok(),
        client_secret: std::env::var("BC_CLIENT_SECRET").ok(),
        use_managed_identity: env_bool("USE_MANAGED_IDENTITY", false),
    };

    let mailchimp = MailchimpConfig {
        api_key: env_var("MAILCHIMP_API_KEY")?,
        server_prefix: env_var("MAILCHIMP_SERVER_PREFIX")?,
        list_id: env_var("MAILCHIMP_LIST_ID")?,
    };

    let defaults = SyncSettings::default();
    let sync = SyncSettings {
        cron: std::env::var("BCSYNC_CRON").unwrap_or(defaults.cron),
        checkpoint_key: std::env::var("BCSYNC_CHECKPOINT_KEY").unwrap_or(defaults.checkpoint_key),
    };

    Ok(AppConfig { bc, mailchimp, sync })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SyncError::Config` if no file is found or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyncError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content; format detected by extension.
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files, returning the first that
/// exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("bcsync.json"),
            cwd.join("bcsync.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("bcsync.json"),
                exe_dir.join("bcsync.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| SyncError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const REQUIRED_VARS: &[&str] = &[
        "BC_TENANT_ID",
        "BC_ENVIRONMENT",
        "BC_COMPANY_ID",
        "BC_CLIENT_ID",
        "BC_CLIENT_SECRET",
        "USE_MANAGED_IDENTITY",
        "MAILCHIMP_API_KEY",
        "MAILCHIMP_SERVER_PREFIX",
        "MAILCHIMP_LIST_ID",
        "BCSYNC_CRON",
        "BCSYNC_CHECKPOINT_KEY",
    ];

    fn clear_env() {
        for key in REQUIRED_VARS {
            std::env::remove_var(key);
        }
    }

    fn set_minimal_env() {
        std::env::set_var("BC_TENANT_ID", "tenant-1");
        std::env::set_var("BC_COMPANY_ID", "company-1");
        std::env::set_var("BC_CLIENT_ID", "client-1");
        std::env::set_var("BC_CLIENT_SECRET", "secret-1");
        std::env::set_var("MAILCHIMP_API_KEY", "key-us1");
        std::env::set_var("MAILCHIMP_SERVER_PREFIX", "us1");
        std::env::set_var("MAILCHIMP_LIST_ID", "list-1");
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_BOOL_TRUE_1", "1");
        std::env::set_var("TEST_BOOL_TRUE_YES", "yes");
        std::env::set_var("TEST_BOOL_TRUE_UPPER", "TRUE");
        std::env::set_var("TEST_BOOL_FALSE_0", "0");
        std::env::set_var("TEST_BOOL_FALSE_OFF", "off");

        assert!(env_bool("TEST_BOOL_TRUE_1", false));
        assert!(env_bool("TEST_BOOL_TRUE_YES", false));
        assert!(env_bool("TEST_BOOL_TRUE_UPPER", false));
        assert!(!env_bool("TEST_BOOL_FALSE_0", true));
        assert!(!env_bool("TEST_BOOL_FALSE_OFF", true));

        std::env::remove_var("TEST_BOOL_MISSING");
        assert!(env_bool("TEST_BOOL_MISSING", true));
        assert!(!env_bool("TEST_BOOL_MISSING", false));

        std::env::remove_var("TEST_BOOL_TRUE_1");
        std::env::remove_var("TEST_BOOL_TRUE_YES");
        std::env::remove_var("TEST_BOOL_TRUE_UPPER");
        std::env::remove_var("TEST_BOOL_FALSE_0");
        std::env::remove_var("TEST_BOOL_FALSE_OFF");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_minimal_env();
        std::env::set_var("BC_ENVIRONMENT", "sandbox");
        std::env::set_var("USE_MANAGED_IDENTITY", "false");
        std::env::set_var("BCSYNC_CRON", "0 */10 * * * *");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.bc.tenant_id, "tenant-1");
        assert_eq!(config.bc.environment, "sandbox");
        assert_eq!(config.bc.client_id.as_deref(), Some("client-1"));
        assert!(!config.bc.use_managed_identity);
        assert_eq!(config.mailchimp.server_prefix, "us1");
        assert_eq!(config.sync.cron, "0 */10 * * * *");

        clear_env();
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_minimal_env();

        let config = load_from_env().expect("config from env");
        assert_eq!(config.bc.environment, "production");
        assert_eq!(config.sync.cron, SyncSettings::default().cron);
        assert_eq!(config.sync.checkpoint_key, SyncSettings::default().checkpoint_key);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_minimal_env();
        std::env::remove_var("MAILCHIMP_LIST_ID");

        let err = load_from_env().expect_err("should fail");
        match err {
            SyncError::Config(msg) => assert!(msg.contains("MAILCHIMP_LIST_ID")),
            other => panic!("expected config error, got {:?}", other),
        }

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[bc]
tenant_id = "tenant-1"
environment = "production"
company_id = "company-1"
client_id = "client-1"
client_secret = "secret-1"

[mailchimp]
api_key = "key-us1"
server_prefix = "us1"
list_id = "list-1"

[sync]
cron = "0 */15 * * * *"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("config from toml");
        assert_eq!(config.bc.company_id, "company-1");
        assert!(!config.bc.use_managed_identity);
        assert_eq!(config.sync.cron, "0 */15 * * * *");
        // Omitted sync key falls back to the default
        assert_eq!(config.sync.checkpoint_key, SyncSettings::default().checkpoint_key);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "bc": {
                "tenant_id": "tenant-1",
                "environment": "sandbox",
                "company_id": "company-1",
                "use_managed_identity": true
            },
            "mailchimp": {
                "api_key": "key-us1",
                "server_prefix": "us1",
                "list_id": "list-1"
            }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("config from json");
        assert!(config.bc.use_managed_identity);
        assert!(config.bc.client_id.is_none());
        assert_eq!(config.sync.cron, SyncSettings::default().cron);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(matches!(result, Err(SyncError::Config(_))));
    }
}
