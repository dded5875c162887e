//! Checkpoint persistence backends
//!
//! The hosting platform keeps application settings alive across runs, so the
//! production store reads and writes a single RFC 3339 timestamp through an
//! environment variable. The in-memory store backs tests and long-running
//! deployments where the process itself outlives the sync interval.

use async_trait::async_trait;
use bcsync_domain::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use bcsync_core::sync::CheckpointStore;

/// Process-local checkpoint store.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    value: Mutex<Option<DateTime<Utc>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(*self.value.lock().await)
    }

    async fn save(&self, checkpoint: DateTime<Utc>) -> Result<()> {
        *self.value.lock().await = Some(checkpoint);
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        *self.value.lock().await = None;
        Ok(())
    }
}

/// Checkpoint store backed by an environment variable holding an RFC 3339
/// timestamp.
pub struct EnvCheckpointStore {
    key: String,
}

impl EnvCheckpointStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl CheckpointStore for EnvCheckpointStore {
    /// An unparsable stored value is treated as absent; the next run falls
    /// back to a full fetch rather than failing.
    async fn load(&self) -> Result<Option<DateTime<Utc>>> {
        let raw = match std::env::var(&self.key) {
            Ok(value) if !value.is_empty() => value,
            _ => return Ok(None),
        };

        match DateTime::parse_from_rfc3339(&raw) {
            Ok(parsed) => {
                let checkpoint = parsed.with_timezone(&Utc);
                debug!(key = %self.key, %checkpoint, "loaded checkpoint");
                Ok(Some(checkpoint))
            }
            Err(err) => {
                warn!(key = %self.key, %raw, error = %err, "ignoring unparsable checkpoint");
                Ok(None)
            }
        }
    }

    async fn save(&self, checkpoint: DateTime<Utc>) -> Result<()> {
        let value = checkpoint.to_rfc3339_opts(SecondsFormat::Millis, true);
        std::env::set_var(&self.key, &value);
        debug!(key = %self.key, %value, "saved checkpoint");
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        std::env::remove_var(&self.key);
        debug!(key = %self.key, "cleared checkpoint");
        Ok(())
    }
}
