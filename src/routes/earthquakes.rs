use crate::catalog::{normalize, Catalog, FetchError, NormalizeError};
use crate::routes::error_chain_fmt;
use crate::search::{EarthquakeSearch, QueryResults, SearchForm};
use crate::views;
use chrono::Utc;
use maud::Markup;
use rocket::http::Status;
use rocket::response::{Redirect, Responder};
use rocket::{Request, State};
use std::sync::Arc;
use uuid::Uuid;

#[get("/")]
pub fn index() -> Redirect {
    Redirect::to("/earthquakes")
}

#[tracing::instrument(
    name = "Search the earthquake catalog",
    skip(search, catalog),
    fields(request_id = %Uuid::new_v4())
)]
#[get("/earthquakes?<search..>")]
pub async fn search_earthquakes(
    search: SearchForm,
    catalog: &State<Arc<dyn Catalog>>,
) -> Result<Markup, QueryError> {
    let today = Utc::now().date_naive();
    match EarthquakeSearch::parse(&search, today).map_err(QueryError::InvalidInput)? {
        None => Ok(views::search_page(
            &EarthquakeSearch::defaults(today),
            today,
            None,
        )),
        Some(search) => {
            let results = run_search(catalog.inner().as_ref(), search).await?;
            tracing::info!(records = results.records.len(), "Catalog search finished");
            Ok(views::search_page(&results.search, today, Some(&results)))
        }
    }
}

/// Fetches and normalizes the records of `search`, keeping catalog order.
pub async fn run_search(
    catalog: &dyn Catalog,
    search: EarthquakeSearch,
) -> Result<QueryResults, QueryError> {
    let query = search.catalog_query().map_err(QueryError::InvalidInput)?;
    let collection = catalog.fetch(&query).await?;
    let records = normalize(&collection.features)?;
    Ok(QueryResults { search, records })
}

#[derive(thiserror::Error)]
pub enum QueryError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Failed to fetch earthquake data.")]
    Fetch(#[from] FetchError),
    #[error("The earthquake catalog sent records that could not be read.")]
    Normalize(#[from] NormalizeError),
    #[error("Failed to export the earthquake records.")]
    Export(#[from] csv::Error),
}

impl std::fmt::Debug for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl<'r> Responder<'r, 'static> for QueryError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::warn!("QueryError: {:?}", self);
        let status = match self {
            QueryError::InvalidInput(_) => Status::BadRequest,
            QueryError::Fetch(_) | QueryError::Normalize(_) => Status::BadGateway,
            QueryError::Export(_) => Status::InternalServerError,
        };
        let message = match &self {
            QueryError::InvalidInput(message) => message.clone(),
            other => format!("{} Please try again later.", other),
        };
        (status, views::message_page("Earthquake Data Explorer", &message)).respond_to(request)
    }
}
