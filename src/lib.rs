#[macro_use]
extern crate rocket;

pub mod catalog;
pub mod catchers;
pub mod configuration;
pub mod domain;
pub mod email;
pub mod models;
pub mod newsletter;
pub mod notifier;
pub mod routes;
pub mod schema;
pub mod search;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod views;
