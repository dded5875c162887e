//! bcsync - Business Central to Mailchimp customer sync service
//!
//! Wires the token provider, API clients, checkpoint store, and sync service
//! together, then runs the sync on a cron schedule until interrupted.

use std::sync::Arc;

use anyhow::Context;
use bcsync_core::sync::CustomerSyncService;
use bcsync_infra::checkpoint::EnvCheckpointStore;
use bcsync_infra::scheduling::{CustomerSyncScheduler, SyncSchedulerConfig};
use bcsync_infra::{BcClient, EntraTokenProvider, MailchimpClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env file"),
        Err(e) => warn!(error = %e, "could not load .env file; using process environment"),
    }

    let config = bcsync_infra::config::load().context("failed to load configuration")?;

    info!(
        environment = %config.bc.environment,
        list_id = %config.mailchimp.list_id,
        cron = %config.sync.cron,
        "bcsync starting"
    );

    let tokens =
        Arc::new(EntraTokenProvider::new(config.bc.clone()).context("token provider setup")?);
    let source = Arc::new(BcClient::new(&config.bc, tokens).context("Business Central client")?);
    let contacts = Arc::new(MailchimpClient::new(&config.mailchimp).context("Mailchimp client")?);
    let checkpoints = Arc::new(EnvCheckpointStore::new(config.sync.checkpoint_key.clone()));

    let service = Arc::new(CustomerSyncService::new(source, contacts, checkpoints));

    let scheduler_config =
        SyncSchedulerConfig { cron_expression: config.sync.cron.clone(), ..Default::default() };
    let mut scheduler = CustomerSyncScheduler::with_config(scheduler_config, service.clone())
        .context("scheduler setup")?;

    // Run one sync immediately so a fresh deployment does not wait for the
    // first cron tick.
    match service.run_once().await {
        Ok(summary) => info!(
            total = summary.total,
            synced = summary.synced,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "initial sync complete"
        ),
        Err(e) => warn!(error = %e, "initial sync failed; scheduler will retry on schedule"),
    }

    scheduler.start().await.context("failed to start scheduler")?;
    info!("bcsync running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    scheduler.stop().await.context("failed to stop scheduler")?;
    info!("bcsync stopped");

    Ok(())
}
