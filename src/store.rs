//! Persistence of subscriptions and their per-period sent flag.

use crate::domain::{
    EventType, Magnitude, NewSubscriber, SubscriberEmail, Subscription, SubscriptionFilter,
};
use crate::models;
use crate::schema::subscriptions;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::BigInt;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Advisory lock key held for the duration of a notifier run.
const NOTIFIER_RUN_LOCK: i64 = 7_117_501;

diesel::define_sql_function! {
    fn pg_try_advisory_lock(key: BigInt) -> diesel::sql_types::Bool;
}

diesel::define_sql_function! {
    fn pg_advisory_unlock(key: BigInt) -> diesel::sql_types::Bool;
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("A subscription for this email address already exists.")]
    DuplicateSubscription,
    #[error("Failed to run the database migrations: {0}")]
    Migration(String),
    #[error("Failed to execute a query against the subscription store.")]
    Database(#[from] DieselError),
}

pub trait SubscriptionStore {
    /// Creates the subscription table if it does not exist yet.
    fn initialize(&mut self) -> Result<(), StoreError>;

    fn insert_subscription(&mut self, new_subscriber: &NewSubscriber) -> Result<(), StoreError>;

    /// Every subscription with `sent = false`. Rows that no longer parse are
    /// returned as errors so the caller can skip them one by one.
    fn list_pending(&mut self) -> Result<Vec<Result<Subscription, anyhow::Error>>, StoreError>;

    /// Must only be called once the mail transport accepted the digest.
    fn mark_sent(&mut self, email: &SubscriberEmail) -> Result<(), StoreError>;

    /// Clears the sent flag of every row and returns how many rows were touched.
    fn reset_all_sent(&mut self) -> Result<usize, StoreError>;

    /// Returns `false` when another notifier run currently holds the lock.
    fn try_acquire_run_lock(&mut self) -> Result<bool, StoreError>;

    fn release_run_lock(&mut self) -> Result<(), StoreError>;
}

#[derive(thiserror::Error, Debug)]
pub enum SubscribeError {
    #[error("{0}")]
    InvalidEmail(String),
    #[error("{0}")]
    InvalidFilter(String),
    #[error("This email is already subscribed.")]
    DuplicateSubscription,
    #[error("Failed to store the new subscription.")]
    Store(#[source] StoreError),
}

impl From<StoreError> for SubscribeError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateSubscription => SubscribeError::DuplicateSubscription,
            other => SubscribeError::Store(other),
        }
    }
}

/// Validates a subscribe request and stores it with a cleared sent flag.
/// Nothing is written when validation fails.
pub fn subscribe<S>(
    store: &mut S,
    email: String,
    min_magnitude: f32,
    event_type: &str,
) -> Result<NewSubscriber, SubscribeError>
where
    S: SubscriptionStore + ?Sized,
{
    let email = SubscriberEmail::parse(email).map_err(SubscribeError::InvalidEmail)?;
    let filter = SubscriptionFilter {
        min_magnitude: Magnitude::parse(min_magnitude).map_err(SubscribeError::InvalidFilter)?,
        event_type: EventType::parse(event_type).map_err(SubscribeError::InvalidFilter)?,
    };
    let new_subscriber = NewSubscriber { email, filter };
    store.insert_subscription(&new_subscriber)?;
    Ok(new_subscriber)
}

impl SubscriptionStore for PgConnection {
    #[tracing::instrument(name = "Run pending subscription store migrations", skip(self))]
    fn initialize(&mut self) -> Result<(), StoreError> {
        let applied = self
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        tracing::info!(applied_migrations = applied.len(), "Subscription store is ready");
        Ok(())
    }

    #[tracing::instrument(
        name = "Saving new subscription in the database",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    fn insert_subscription(&mut self, new_subscriber: &NewSubscriber) -> Result<(), StoreError> {
        let row = models::NewSubscription {
            email: new_subscriber.email.as_ref(),
            min_magnitude: new_subscriber.filter.min_magnitude.value(),
            event_type: new_subscriber.filter.event_type.as_str(),
            sent: false,
        };
        diesel::insert_into(subscriptions::table)
            .values(&row)
            .execute(self)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::DuplicateSubscription
                }
                e => {
                    tracing::error!("Failed to execute query: {:?}", e);
                    StoreError::Database(e)
                }
            })?;
        Ok(())
    }

    #[tracing::instrument(name = "Get pending subscriptions", skip(self))]
    fn list_pending(&mut self) -> Result<Vec<Result<Subscription, anyhow::Error>>, StoreError> {
        let rows = subscriptions::table
            .filter(subscriptions::sent.eq(false))
            .order(subscriptions::email.asc())
            .load::<models::Subscription>(self)?;

        let pending = rows
            .into_iter()
            .map(|row| Subscription::try_from(row).map_err(|e| anyhow::anyhow!(e)))
            .collect();
        Ok(pending)
    }

    #[tracing::instrument(name = "Mark digest as sent", skip(self))]
    fn mark_sent(&mut self, email: &SubscriberEmail) -> Result<(), StoreError> {
        diesel::update(subscriptions::table.find(email.as_ref()))
            .set(subscriptions::sent.eq(true))
            .execute(self)?;
        Ok(())
    }

    #[tracing::instrument(name = "Reset sent flags", skip(self))]
    fn reset_all_sent(&mut self) -> Result<usize, StoreError> {
        let reset = diesel::update(subscriptions::table)
            .set(subscriptions::sent.eq(false))
            .execute(self)?;
        tracing::info!(reset, "Cleared the sent flag of every subscription");
        Ok(reset)
    }

    fn try_acquire_run_lock(&mut self) -> Result<bool, StoreError> {
        Ok(diesel::select(pg_try_advisory_lock(NOTIFIER_RUN_LOCK)).get_result::<bool>(self)?)
    }

    fn release_run_lock(&mut self) -> Result<(), StoreError> {
        let released =
            diesel::select(pg_advisory_unlock(NOTIFIER_RUN_LOCK)).get_result::<bool>(self)?;
        if !released {
            tracing::warn!("The notifier run lock was not held by this session");
        }
        Ok(())
    }
}
