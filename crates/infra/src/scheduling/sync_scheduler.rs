//! Cron-driven customer sync scheduler.
//!
//! Triggers the customer sync service at fixed intervals. Join handles are
//! tracked, cancellation is explicit, and every asynchronous operation is
//! wrapped in a timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bcsync_core::sync::CustomerSyncService;
//! use bcsync_infra::scheduling::{CustomerSyncScheduler, SchedulerResult, SyncSchedulerConfig};
//!
//! # async fn example(service: Arc<CustomerSyncService>) -> SchedulerResult<()> {
//! let mut scheduler = CustomerSyncScheduler::with_config(
//!     SyncSchedulerConfig {
//!         cron_expression: "0 */5 * * * *".into(), // every 5 minutes
//!         ..Default::default()
//!     },
//!     service,
//! )?;
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use bcsync_core::sync::CustomerSyncService;
use bcsync_domain::constants::DEFAULT_SYNC_CRON;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the customer sync scheduler.
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single sync run.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: DEFAULT_SYNC_CRON.into(), // every 5 minutes
            job_timeout: Duration::from_secs(240),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Customer sync scheduler with explicit lifecycle management.
pub struct CustomerSyncScheduler {
    scheduler: Option<JobScheduler>,
    config: SyncSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    service: Arc<CustomerSyncService>,
}

impl CustomerSyncScheduler {
    /// Create a scheduler with the default configuration and the given cron
    /// expression.
    pub fn new(cron_expression: String, service: Arc<CustomerSyncService>) -> SchedulerResult<Self> {
        let config = SyncSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, service)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(
        config: SyncSchedulerConfig,
        service: Arc<CustomerSyncService>,
    ) -> SchedulerResult<Self> {
        Ok(Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            service,
        })
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?;

        start_result.map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!(scheduler = "customer_sync", event = "start", "customer sync scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?;

        stop_result.map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??
        }

        info!(scheduler = "customer_sync", event = "stop", "customer sync scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;
        let cron_expr = self.config.cron_expression.clone();
        let service = self.service.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let service = service.clone();

            Box::pin(async move {
                let started = Instant::now();

                match tokio::time::timeout(job_timeout, service.run_once()).await {
                    Ok(Ok(summary)) => {
                        debug!(
                            scheduler = "customer_sync",
                            event = "job_complete",
                            total = summary.total,
                            synced = summary.synced,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "sync run finished"
                        );
                    }
                    Ok(Err(err)) => {
                        error!(
                            scheduler = "customer_sync",
                            error = %err,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "sync run failed"
                        );
                    }
                    Err(elapsed) => {
                        warn!(
                            scheduler = "customer_sync",
                            event = "job_timeout",
                            timeout_secs = job_timeout.as_secs(),
                            elapsed = ?elapsed,
                            "sync run timed out"
                        );
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "registered customer sync job");
        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!(
            scheduler = "customer_sync",
            event = "monitor_cancelled",
            "customer sync scheduler monitor cancelled"
        );
    }
}

impl Drop for CustomerSyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!(
                scheduler = "customer_sync",
                event = "drop_cancel",
                "CustomerSyncScheduler dropped while running; cancelling tasks"
            );
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bcsync_core::sync::{ContactStore, CustomerSource};
    use bcsync_domain::{Customer, Result as DomainResult};
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::checkpoint::InMemoryCheckpointStore;

    struct EmptySource;

    #[async_trait]
    impl CustomerSource for EmptySource {
        async fn changed_since(
            &self,
            _since: Option<DateTime<Utc>>,
        ) -> DomainResult<Vec<Customer>> {
            Ok(Vec::new())
        }
    }

    struct NoopContacts;

    #[async_trait]
    impl ContactStore for NoopContacts {
        async fn upsert_contact(&self, _customer: &Customer) -> DomainResult<()> {
            Ok(())
        }

        async fn delete_contact(&self, _email: &str) -> DomainResult<()> {
            Ok(())
        }

        async fn tag_contact(&self, _email: &str, _tags: &[String]) -> DomainResult<()> {
            Ok(())
        }
    }

    fn test_service() -> Arc<CustomerSyncService> {
        Arc::new(CustomerSyncService::new(
            Arc::new(EmptySource),
            Arc::new(NoopContacts),
            Arc::new(InMemoryCheckpointStore::new()),
        ))
    }

    fn fast_config() -> SyncSchedulerConfig {
        SyncSchedulerConfig {
            cron_expression: "*/1 * * * * *".into(), // every second
            job_timeout: Duration::from_secs(2),
            start_timeout: Duration::from_secs(2),
            stop_timeout: Duration::from_secs(2),
            join_timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_runs_successfully() {
        let mut scheduler = CustomerSyncScheduler::with_config(fast_config(), test_service())
            .expect("scheduler created");

        scheduler.start().await.expect("start succeeds");
        tokio::time::sleep(Duration::from_secs(2)).await;
        scheduler.stop().await.expect("stop succeeds");

        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_is_rejected() {
        let mut scheduler = CustomerSyncScheduler::with_config(fast_config(), test_service())
            .expect("scheduler created");

        scheduler.start().await.expect("first start");
        let err = scheduler.start().await.expect_err("second start fails");
        assert!(matches!(err, SchedulerError::AlreadyRunning));
        scheduler.stop().await.expect("stop succeeds");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_without_start_is_rejected() {
        let mut scheduler = CustomerSyncScheduler::with_config(fast_config(), test_service())
            .expect("scheduler created");

        let err = scheduler.stop().await.expect_err("stop fails");
        assert!(matches!(err, SchedulerError::NotRunning));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restart_after_stop_succeeds() {
        let mut scheduler = CustomerSyncScheduler::with_config(fast_config(), test_service())
            .expect("scheduler created");

        scheduler.start().await.expect("start succeeds");
        scheduler.stop().await.expect("stop succeeds");
        assert!(!scheduler.is_running());

        scheduler.start().await.expect("start again");
        scheduler.stop().await.expect("stop again");
    }
}
