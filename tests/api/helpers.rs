use async_trait::async_trait;
use diesel::{Connection, PgConnection, RunQueryDsl};
use once_cell::sync::Lazy;
use quakewatch::catalog::{Catalog, FeatureCollection, FetchError};
use quakewatch::configuration::{get_configuration, Settings};
use quakewatch::domain::{CatalogQuery, NewSubscriber, SubscriberEmail, Subscription};
use quakewatch::email::Email;
use quakewatch::models;
use quakewatch::startup;
use quakewatch::store::{StoreError, SubscriptionStore};
use quakewatch::telemetry::{get_subscriber, init_subscriber};
use rocket::local::asynchronous::Client;
use secrecy::ExposeSecret;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".into();
    let subscriber_name = "test".into();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber).expect("Failed to install the tracing subscriber.");
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).expect("Failed to install the tracing subscriber.");
    }
});

/// A catalog feature the way the FDSN service encodes it.
pub fn feature(place: &str, magnitude: f64, time_millis: i64) -> serde_json::Value {
    let url = format!(
        "https://earthquake.usgs.gov/earthquakes/eventpage/{}",
        place.replace(' ', "_")
    );
    json!({
        "type": "Feature",
        "properties": {
            "place": place,
            "mag": magnitude,
            "time": time_millis,
            "url": url,
            "type": "earthquake"
        },
        "geometry": { "type": "Point", "coordinates": [142.3, 38.1, 24.0] },
        "id": Uuid::new_v4().to_string()
    })
}

/// Serves fixed features, keeping only those that reach the query's
/// magnitude floor, and records every query it receives.
pub struct StubCatalog {
    features: Result<Vec<serde_json::Value>, reqwest::StatusCode>,
    queries: Mutex<Vec<CatalogQuery>>,
}

impl StubCatalog {
    pub fn with_features(features: Vec<serde_json::Value>) -> Self {
        Self {
            features: Ok(features),
            queries: Mutex::new(vec![]),
        }
    }

    pub fn failing(status: reqwest::StatusCode) -> Self {
        Self {
            features: Err(status),
            queries: Mutex::new(vec![]),
        }
    }

    pub fn received_queries(&self) -> Vec<CatalogQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for StubCatalog {
    async fn fetch(&self, query: &CatalogQuery) -> Result<FeatureCollection, FetchError> {
        self.queries.lock().unwrap().push(query.clone());
        let floor = f64::from(query.filter().min_magnitude.value());
        match &self.features {
            Ok(features) => Ok(FeatureCollection {
                features: features
                    .iter()
                    .filter(|f| f["properties"]["mag"].as_f64().map_or(true, |m| m >= floor))
                    .cloned()
                    .collect(),
            }),
            Err(status) => Err(FetchError::Status(*status)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
}

#[derive(Default)]
pub struct RecordingEmailClient {
    sent: Mutex<Vec<SentEmail>>,
    rejected_recipients: HashSet<String>,
}

impl RecordingEmailClient {
    pub fn rejecting(recipients: &[&str]) -> Self {
        Self {
            sent: Mutex::new(vec![]),
            rejected_recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Email for RecordingEmailClient {
    async fn send_email(
        &self,
        recipient: SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        if self.rejected_recipients.contains(recipient.as_ref()) {
            anyhow::bail!("550 mailbox unavailable: {}", recipient);
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.as_ref().to_string(),
            subject: subject.to_string(),
            html_content: html_content.to_string(),
            text_content: text_content.to_string(),
        });
        Ok(())
    }
}

/// Keeps rows the way the `subscriptions` table does, without a database.
#[derive(Default)]
pub struct InMemoryStore {
    pub rows: Vec<models::Subscription>,
    pub locked: bool,
    pub fail_mark_sent: bool,
}

impl InMemoryStore {
    pub fn with_rows(rows: &[(&str, f32, &str, bool)]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|(email, min_magnitude, event_type, sent)| models::Subscription {
                    email: email.to_string(),
                    min_magnitude: *min_magnitude,
                    event_type: event_type.to_string(),
                    sent: *sent,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_sent(&self, email: &str) -> bool {
        self.rows
            .iter()
            .find(|row| row.email == email)
            .map(|row| row.sent)
            .expect("No row for this email.")
    }
}

impl SubscriptionStore for InMemoryStore {
    fn initialize(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_subscription(&mut self, new_subscriber: &NewSubscriber) -> Result<(), StoreError> {
        let email = new_subscriber.email.as_ref();
        if self.rows.iter().any(|row| row.email == email) {
            return Err(StoreError::DuplicateSubscription);
        }
        self.rows.push(models::Subscription {
            email: email.to_string(),
            min_magnitude: new_subscriber.filter.min_magnitude.value(),
            event_type: new_subscriber.filter.event_type.as_str().to_string(),
            sent: false,
        });
        Ok(())
    }

    fn list_pending(&mut self) -> Result<Vec<Result<Subscription, anyhow::Error>>, StoreError> {
        let mut pending: Vec<_> = self.rows.iter().filter(|row| !row.sent).cloned().collect();
        pending.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(pending
            .into_iter()
            .map(|row| Subscription::try_from(row).map_err(|e| anyhow::anyhow!(e)))
            .collect())
    }

    fn mark_sent(&mut self, email: &SubscriberEmail) -> Result<(), StoreError> {
        if self.fail_mark_sent {
            return Err(StoreError::Database(diesel::result::Error::NotFound));
        }
        for row in self.rows.iter_mut().filter(|row| row.email == email.as_ref()) {
            row.sent = true;
        }
        Ok(())
    }

    fn reset_all_sent(&mut self) -> Result<usize, StoreError> {
        for row in self.rows.iter_mut() {
            row.sent = false;
        }
        Ok(self.rows.len())
    }

    fn try_acquire_run_lock(&mut self) -> Result<bool, StoreError> {
        if self.locked {
            return Ok(false);
        }
        self.locked = true;
        Ok(true)
    }

    fn release_run_lock(&mut self) -> Result<(), StoreError> {
        self.locked = false;
        Ok(())
    }
}

pub struct TestApp {
    pub client: Client,
    pub catalog: Arc<StubCatalog>,
}

impl TestApp {
    pub async fn get_page(&self, uri: &str) -> (u16, String) {
        let response = self.client.get(uri).dispatch().await;
        let status = response.status().code;
        let body = response.into_string().await.unwrap_or_default();
        (status, body)
    }

    pub async fn post_subscriptions(&self, body: &str) -> (u16, String) {
        let response = self
            .client
            .post("/subscriptions")
            .header(rocket::http::ContentType::Form)
            .body(body.to_string())
            .dispatch()
            .await;
        let status = response.status().code;
        let body = response.into_string().await.unwrap_or_default();
        (status, body)
    }
}

/// The web application without a database pool.
pub async fn spawn_app(catalog: StubCatalog) -> TestApp {
    Lazy::force(&TRACING);

    let catalog = Arc::new(catalog);
    let figment = rocket::Config::figment().merge(("log_level", "off"));
    let client = Client::tracked(startup::rocket(figment, catalog.clone()))
        .await
        .expect("Failed to build the rocket instance.");
    TestApp { client, catalog }
}

/// The web application backed by a fresh Postgres database.
pub async fn spawn_app_with_database(catalog: StubCatalog) -> (TestApp, PgConnection) {
    Lazy::force(&TRACING);

    let (configuration, connection) = configure_database();
    let catalog = Arc::new(catalog);
    let figment = startup::figment(&configuration).merge(("log_level", "off"));
    let client = Client::tracked(startup::with_subscriptions(startup::rocket(
        figment,
        catalog.clone(),
    )))
    .await
    .expect("Failed to build the rocket instance.");
    (TestApp { client, catalog }, connection)
}

/// Creates a uniquely named database and brings its schema up to date.
pub fn configure_database() -> (Settings, PgConnection) {
    Lazy::force(&TRACING);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();

    let mut connection = PgConnection::establish(
        configuration
            .database
            .connection_string_without_database()
            .expose_secret(),
    )
    .expect("Failed to connect to Postgres.");
    diesel::sql_query(format!(
        "CREATE DATABASE \"{}\"",
        configuration.database.database_name
    ))
    .execute(&mut connection)
    .expect("Failed to create database.");

    let mut connection =
        PgConnection::establish(configuration.database.connection_string().expose_secret())
            .expect("Failed to connect to Postgres.");
    connection
        .initialize()
        .expect("Failed to migrate the database.");
    (configuration, connection)
}

pub fn connect(configuration: &Settings) -> PgConnection {
    PgConnection::establish(configuration.database.connection_string().expose_secret())
        .expect("Failed to connect to Postgres.")
}
