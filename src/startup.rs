use crate::catalog::{Catalog, UsgsCatalog};
use crate::catchers::*;
use crate::configuration::Settings;
use crate::email::{Email, SmtpEmailClient};
use crate::notifier::{DispatchReport, Notifier};
use crate::routes::*;
use crate::store::SubscriptionStore;
use anyhow::Context;
use chrono::Utc;
use diesel::{Connection, PgConnection};
use rocket::fairing::{self, AdHoc};
use rocket::figment::util::map;
use rocket::figment::value::{Map, Value};
use rocket::figment::Figment;
use rocket::{Build, Config, Ignite, Rocket};
use rocket_sync_db_pools::database;
use secrecy::ExposeSecret;
use std::sync::Arc;

#[database("quakes")]
pub struct QuakesDbConn(PgConnection);

/// Search pages, export and catchers. These need no database.
pub fn rocket(figment: Figment, catalog: Arc<dyn Catalog>) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(catalog)
        .mount("/", routes![health, index, search_earthquakes, export_csv])
        .register("/", catchers![unprocessable_entity_to_bad_request])
}

/// Mounts `POST /subscriptions` together with the pool its guard depends on;
/// the guard refuses to ignite without the pool fairing.
pub fn with_subscriptions(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(QuakesDbConn::fairing())
        .mount("/", routes![subscribe])
}

pub fn figment(configuration: &Settings) -> Figment {
    let database: Map<_, Value> = map! {
        "url" => configuration.database.connection_string().expose_secret().as_str().into(),
    };
    Config::figment()
        .merge(("port", configuration.application.port))
        .merge(("address", configuration.application.host))
        .merge(("databases", map!["quakes" => database]))
}

pub async fn build(configuration: &Settings) -> Result<Rocket<Ignite>, anyhow::Error> {
    let catalog = UsgsCatalog::new(
        configuration.catalog.base_url.clone(),
        configuration.catalog.timeout(),
    )
    .context("Failed to build the catalog HTTP client.")?;
    with_subscriptions(rocket(figment(configuration), Arc::new(catalog)))
        .attach(AdHoc::try_on_ignite(
            "Subscription store migrations",
            initialize_store,
        ))
        .ignite()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ignite the web server: {}", e))
}

async fn initialize_store(rocket: Rocket<Build>) -> fairing::Result {
    let conn = match QuakesDbConn::get_one(&rocket).await {
        Some(conn) => conn,
        None => {
            tracing::error!("No database connection available for the migrations");
            return Err(rocket);
        }
    };
    match conn.run(|c: &mut PgConnection| c.initialize()).await {
        Ok(()) => Ok(rocket),
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, "Failed to initialize the subscription store");
            Err(rocket)
        }
    }
}

/// One notifier run against the configured store, catalog and mail relay.
pub async fn notify(
    configuration: &Settings,
    new_period: bool,
) -> Result<DispatchReport, anyhow::Error> {
    let mut connection =
        PgConnection::establish(configuration.database.connection_string().expose_secret())
            .context("Failed to connect to Postgres.")?;
    connection
        .initialize()
        .context("Failed to initialize the subscription store.")?;

    let catalog: Arc<dyn Catalog> = Arc::new(
        UsgsCatalog::new(
            configuration.catalog.base_url.clone(),
            configuration.catalog.timeout(),
        )
        .context("Failed to build the catalog HTTP client.")?,
    );
    let email_client: Arc<dyn Email> = Arc::new(SmtpEmailClient::new(&configuration.email_client)?);

    let notifier = Notifier::new(catalog, email_client, configuration.notifier.period());
    let report = notifier
        .run(&mut connection, new_period, Utc::now())
        .await
        .context("The notifier run failed.")?;
    Ok(report)
}
