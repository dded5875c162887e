//! Scheduler error types

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tokio_cron_scheduler::JobSchedulerError;

/// Errors raised by scheduler lifecycle operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("scheduler is not running")]
    NotRunning,

    #[error("failed to create scheduler")]
    CreationFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("failed to start scheduler")]
    StartFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("failed to stop scheduler")]
    StopFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("failed to register sync job")]
    JobRegistrationFailed {
        #[source]
        source: JobSchedulerError,
    },

    #[error("scheduler operation timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: Elapsed,
    },

    #[error("scheduler task failed to join")]
    TaskJoinFailed(#[from] JoinError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
