//! Customer sync orchestrator - core business logic
//!
//! Pulls the delta set from the customer source, filters records without a
//! usable email, upserts the rest into the contact store one at a time, and
//! aggregates the outcome into a [`SyncSummary`].
//!
//! Failure policy: a fetch-stage failure aborts the run and propagates to
//! the caller; per-record failures are caught, collected, and never abort
//! processing of subsequent records.

use std::sync::Arc;

use bcsync_domain::{Result, SyncFailure, SyncSummary};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{CheckpointStore, ContactStore, CustomerSource};

/// Customer sync orchestrator
pub struct CustomerSyncService {
    source: Arc<dyn CustomerSource>,
    contacts: Arc<dyn ContactStore>,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl CustomerSyncService {
    /// Create a new sync service over the given ports.
    pub fn new(
        source: Arc<dyn CustomerSource>,
        contacts: Arc<dyn ContactStore>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self { source, contacts, checkpoints }
    }

    /// Execute one sync pass.
    ///
    /// 1. Capture the fetch-start time as the tentative new checkpoint.
    /// 2. Fetch customers changed since the previous checkpoint.
    /// 3. On fetch success, advance the checkpoint to the captured time,
    ///    even when zero rows came back. A failed fetch leaves it untouched.
    /// 4. Process records sequentially, isolating per-record failures.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<SyncSummary> {
        let fetch_started = Utc::now();
        let since = self.checkpoints.load().await?;

        debug!(checkpoint = ?since, "checking for customer changes");

        let customers = match self.source.changed_since(since).await {
            Ok(customers) => customers,
            Err(err) => {
                if err.is_auth_related() {
                    error!(
                        error = %err,
                        "Business Central rejected the request; verify the Entra \
                         credentials and that the app has API access to the environment"
                    );
                }
                return Err(err);
            }
        };

        // Checkpoint advancement depends only on fetch success, not on the
        // result set size or on downstream upsert outcomes.
        self.checkpoints.save(fetch_started).await?;

        if customers.is_empty() {
            info!("no customer changes detected");
            return Ok(SyncSummary::default());
        }

        info!(count = customers.len(), "processing changed customers");

        let mut summary = SyncSummary { total: customers.len(), ..SyncSummary::default() };

        for customer in &customers {
            if !customer.has_valid_email() {
                debug!(customer = %customer.display_name, "skipping customer without valid email");
                summary.skipped += 1;
                continue;
            }

            match self.contacts.upsert_contact(customer).await {
                Ok(()) => {
                    debug!(
                        customer = %customer.display_name,
                        email = customer.email.as_deref().unwrap_or_default(),
                        "synced customer"
                    );
                    summary.synced += 1;
                }
                Err(err) => {
                    warn!(customer = %customer.display_name, error = %err, "failed to sync customer");
                    summary.errors.push(SyncFailure {
                        customer: customer.display_name.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            total = summary.total,
            synced = summary.synced,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "customer sync summary"
        );

        if !summary.errors.is_empty() {
            warn!(failures = ?summary.errors, "sync completed with per-record errors");
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use bcsync_domain::{Customer, SyncError};
    use chrono::{DateTime, Duration, Utc};
    use tokio::sync::Mutex;

    use super::*;

    struct MockSource {
        response: Result<Vec<Customer>>,
        seen_since: Mutex<Option<Option<DateTime<Utc>>>>,
    }

    impl MockSource {
        fn with_customers(customers: Vec<Customer>) -> Self {
            Self { response: Ok(customers), seen_since: Mutex::new(None) }
        }

        fn failing(err: SyncError) -> Self {
            Self { response: Err(err), seen_since: Mutex::new(None) }
        }
    }

    #[async_trait]
    impl CustomerSource for MockSource {
        async fn changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Customer>> {
            *self.seen_since.lock().await = Some(since);
            self.response.clone()
        }
    }

    struct MockContacts {
        upserts: AtomicUsize,
        fail_for: Option<String>,
    }

    impl MockContacts {
        fn new() -> Self {
            Self { upserts: AtomicUsize::new(0), fail_for: None }
        }

        fn failing_for(customer_id: &str) -> Self {
            Self { upserts: AtomicUsize::new(0), fail_for: Some(customer_id.to_string()) }
        }

        fn upsert_count(&self) -> usize {
            self.upserts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContactStore for MockContacts {
        async fn upsert_contact(&self, customer: &Customer) -> Result<()> {
            if self.fail_for.as_deref() == Some(customer.id.as_str()) {
                return Err(SyncError::Api { status: 400, body: "Invalid Resource".into() });
            }
            self.upserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_contact(&self, _email: &str) -> Result<()> {
            Ok(())
        }

        async fn tag_contact(&self, _email: &str, _tags: &[String]) -> Result<()> {
            Ok(())
        }
    }

    struct MockCheckpoints {
        stored: Mutex<Option<DateTime<Utc>>>,
    }

    impl MockCheckpoints {
        fn empty() -> Self {
            Self { stored: Mutex::new(None) }
        }

        fn at(checkpoint: DateTime<Utc>) -> Self {
            Self { stored: Mutex::new(Some(checkpoint)) }
        }

        async fn current(&self) -> Option<DateTime<Utc>> {
            *self.stored.lock().await
        }
    }

    #[async_trait]
    impl CheckpointStore for MockCheckpoints {
        async fn load(&self) -> Result<Option<DateTime<Utc>>> {
            Ok(*self.stored.lock().await)
        }

        async fn save(&self, checkpoint: DateTime<Utc>) -> Result<()> {
            *self.stored.lock().await = Some(checkpoint);
            Ok(())
        }

        async fn reset(&self) -> Result<()> {
            *self.stored.lock().await = None;
            Ok(())
        }
    }

    fn customer(id: &str, name: &str, email: Option<&str>) -> Customer {
        Customer {
            id: id.to_string(),
            number: format!("1000{id}"),
            display_name: name.to_string(),
            email: email.map(String::from),
            ..Customer::default()
        }
    }

    fn service(
        source: Arc<MockSource>,
        contacts: Arc<MockContacts>,
        checkpoints: Arc<MockCheckpoints>,
    ) -> CustomerSyncService {
        CustomerSyncService::new(source, contacts, checkpoints)
    }

    #[tokio::test]
    async fn mixed_run_counts_each_outcome_and_still_succeeds() {
        let source = Arc::new(MockSource::with_customers(vec![
            customer("1", "Jane Doe", Some("jane@contoso.com")),
            customer("2", "No Email Ltd", None),
            customer("3", "Broken Corp", Some("broken@contoso.com")),
        ]));
        let contacts = Arc::new(MockContacts::failing_for("3"));
        let checkpoints = Arc::new(MockCheckpoints::empty());

        let summary = service(source, contacts.clone(), checkpoints)
            .run_once()
            .await
            .expect("run succeeds despite per-record failures");

        assert_eq!(summary.total, 3);
        assert_eq!(summary.synced, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].customer, "Broken Corp");
        assert!(summary.errors[0].message.contains("400"));
        assert_eq!(contacts.upsert_count(), 1);
    }

    #[tokio::test]
    async fn per_record_failure_does_not_stop_later_records() {
        let source = Arc::new(MockSource::with_customers(vec![
            customer("1", "Broken Corp", Some("broken@contoso.com")),
            customer("2", "Jane Doe", Some("jane@contoso.com")),
        ]));
        let contacts = Arc::new(MockContacts::failing_for("1"));
        let checkpoints = Arc::new(MockCheckpoints::empty());

        let summary =
            service(source, contacts.clone(), checkpoints).run_once().await.expect("run succeeds");

        assert_eq!(summary.synced, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(contacts.upsert_count(), 1);
    }

    #[tokio::test]
    async fn empty_delta_set_performs_no_upserts() {
        let source = Arc::new(MockSource::with_customers(vec![]));
        let contacts = Arc::new(MockContacts::new());
        let checkpoints = Arc::new(MockCheckpoints::empty());

        let summary = service(source, contacts.clone(), checkpoints.clone())
            .run_once()
            .await
            .expect("empty run succeeds");

        assert!(summary.is_empty());
        assert_eq!(contacts.upsert_count(), 0);
        // Checkpoint still advances on a successful zero-row fetch
        assert!(checkpoints.current().await.is_some());
    }

    #[tokio::test]
    async fn checkpoint_advances_to_fetch_start_on_success() {
        let before = Utc::now();
        let source = Arc::new(MockSource::with_customers(vec![]));
        let contacts = Arc::new(MockContacts::new());
        let checkpoints = Arc::new(MockCheckpoints::empty());

        service(source, contacts, checkpoints.clone()).run_once().await.expect("run succeeds");
        let after = Utc::now();

        let saved = checkpoints.current().await.expect("checkpoint saved");
        assert!(saved >= before && saved <= after);
    }

    #[tokio::test]
    async fn checkpoint_unchanged_when_fetch_fails() {
        let previous = Utc::now() - Duration::minutes(30);
        let source = Arc::new(MockSource::failing(SyncError::Api {
            status: 500,
            body: "internal".into(),
        }));
        let contacts = Arc::new(MockContacts::new());
        let checkpoints = Arc::new(MockCheckpoints::at(previous));

        let err = service(source, contacts.clone(), checkpoints.clone())
            .run_once()
            .await
            .expect_err("fetch failure propagates");

        assert!(matches!(err, SyncError::Api { status: 500, .. }));
        assert_eq!(checkpoints.current().await, Some(previous));
        assert_eq!(contacts.upsert_count(), 0);
    }

    #[tokio::test]
    async fn auth_failure_propagates_unswallowed() {
        let source =
            Arc::new(MockSource::failing(SyncError::Api { status: 401, body: "denied".into() }));
        let contacts = Arc::new(MockContacts::new());
        let checkpoints = Arc::new(MockCheckpoints::empty());

        let err = service(source, contacts, checkpoints)
            .run_once()
            .await
            .expect_err("auth failure propagates");

        assert!(err.is_auth_related());
    }

    #[tokio::test]
    async fn previous_checkpoint_is_passed_to_the_source() {
        let previous = Utc::now() - Duration::minutes(5);
        let source = Arc::new(MockSource::with_customers(vec![]));
        let contacts = Arc::new(MockContacts::new());
        let checkpoints = Arc::new(MockCheckpoints::at(previous));

        service(source.clone(), contacts, checkpoints).run_once().await.expect("run succeeds");

        let seen = source.seen_since.lock().await.expect("source was called");
        assert_eq!(seen, Some(previous));
    }
}
