//! Periodic digest dispatch.
//!
//! A run walks every subscription whose sent flag is still clear, fetches the
//! records of the last period with that subscription's own filter and mails
//! the digest. Only a delivery the mail transport accepted sets the flag, so a
//! row that failed stays pending and is retried by the next run of the same
//! period. Starting a new period clears every flag first.

use crate::catalog::{normalize, Catalog, FetchError, NormalizeError};
use crate::domain::{CatalogQuery, SubscriberEmail, Subscription};
use crate::email::Email;
use crate::newsletter::{Digest, EmptyDigest, DIGEST_SUBJECT};
use crate::store::{StoreError, SubscriptionStore};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum NotifierError {
    #[error("Another notifier run is in progress.")]
    AlreadyRunning,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a single subscription did not get its digest. None of these abort the run.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("Failed to fetch the earthquake records.")]
    Fetch(#[from] FetchError),
    #[error("Failed to normalize the earthquake records.")]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    EmptyDigest(#[from] EmptyDigest),
    #[error("The mail transport rejected the digest.")]
    Transport(#[source] anyhow::Error),
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    /// How many flags were cleared when the run started a new period.
    pub reset: Option<usize>,
    pub delivery_attempts: usize,
    pub sent: Vec<SubscriberEmail>,
    /// Subscriptions with no matching record in the period.
    pub skipped: Vec<SubscriberEmail>,
    pub failed: Vec<(SubscriberEmail, DeliveryError)>,
    /// Stored rows whose contact details or filter no longer parse.
    pub invalid_rows: usize,
}

pub struct Notifier {
    catalog: Arc<dyn Catalog>,
    email_client: Arc<dyn Email>,
    period: Duration,
}

impl Notifier {
    pub fn new(catalog: Arc<dyn Catalog>, email_client: Arc<dyn Email>, period: Duration) -> Self {
        Self {
            catalog,
            email_client,
            period,
        }
    }

    /// Dispatches one batch. The store's run lock is held for the whole batch
    /// and released on every exit path once acquired.
    #[tracing::instrument(name = "Dispatch digests", skip(self, store))]
    pub async fn run<S>(
        &self,
        store: &mut S,
        new_period: bool,
        now: DateTime<Utc>,
    ) -> Result<DispatchReport, NotifierError>
    where
        S: SubscriptionStore + ?Sized,
    {
        if !store.try_acquire_run_lock()? {
            return Err(NotifierError::AlreadyRunning);
        }
        let outcome = self.run_locked(store, new_period, now).await;
        let released = store.release_run_lock();

        let report = outcome?;
        released?;
        tracing::info!(
            sent = report.sent.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            delivery_attempts = report.delivery_attempts,
            "Digest dispatch finished"
        );
        Ok(report)
    }

    async fn run_locked<S>(
        &self,
        store: &mut S,
        new_period: bool,
        now: DateTime<Utc>,
    ) -> Result<DispatchReport, NotifierError>
    where
        S: SubscriptionStore + ?Sized,
    {
        let mut report = DispatchReport::default();
        if new_period {
            report.reset = Some(store.reset_all_sent()?);
        }

        for subscription in store.list_pending()? {
            let subscription = match subscription {
                Ok(subscription) => subscription,
                Err(error) => {
                    tracing::warn!(error.cause_chain = ?error,
                        "Skipping a pending subscription. \
                        Its stored contact details or filter are invalid",
                    );
                    report.invalid_rows += 1;
                    continue;
                }
            };

            match self.deliver_digest(&subscription, now).await {
                Ok(()) => {
                    report.delivery_attempts += 1;
                    store.mark_sent(&subscription.email)?;
                    report.sent.push(subscription.email);
                }
                Err(DeliveryError::EmptyDigest(_)) => {
                    tracing::info!(
                        subscriber_email = %subscription.email,
                        "No matching earthquakes in this period, nothing to send"
                    );
                    report.skipped.push(subscription.email);
                }
                Err(error) => {
                    if matches!(error, DeliveryError::Transport(_)) {
                        report.delivery_attempts += 1;
                    }
                    tracing::warn!(
                        error.cause_chain = ?error,
                        subscriber_email = %subscription.email,
                        "Failed to deliver a digest, the subscription stays pending"
                    );
                    report.failed.push((subscription.email, error));
                }
            }
        }
        Ok(report)
    }

    #[tracing::instrument(
        name = "Deliver a digest",
        skip(self, subscription, now),
        fields(subscriber_email = %subscription.email)
    )]
    async fn deliver_digest(
        &self,
        subscription: &Subscription,
        now: DateTime<Utc>,
    ) -> Result<(), DeliveryError> {
        let query = CatalogQuery::for_period(now, self.period, subscription.filter);
        let collection = self.catalog.fetch(&query).await?;
        let records = normalize(&collection.features)?;
        let digest = Digest::new(&records)?;

        self.email_client
            .send_email(
                subscription.email.clone(),
                DIGEST_SUBJECT,
                &digest.to_html().into_string(),
                &digest.to_text(),
            )
            .await
            .map_err(DeliveryError::Transport)
    }
}
