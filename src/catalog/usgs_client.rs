use crate::catalog::{parse_feature_collection, Catalog, FeatureCollection, FetchError};
use crate::domain::CatalogQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct UsgsCatalog {
    http_client: reqwest::Client,
    base_url: String,
}

impl UsgsCatalog {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Builds the GET request for `query` without sending it.
    pub fn request(&self, query: &CatalogQuery) -> reqwest::RequestBuilder {
        let filter = query.filter();
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));
        self.http_client.get(url).query(&[
            ("format", "geojson".to_string()),
            ("starttime", format_time(query.start())),
            ("endtime", format_time(query.end())),
            ("minmagnitude", filter.min_magnitude.to_string()),
            ("eventtype", filter.event_type.as_str().to_string()),
        ])
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format(QUERY_TIME_FORMAT).to_string()
}

#[async_trait]
impl Catalog for UsgsCatalog {
    #[tracing::instrument(name = "Fetch events from the earthquake catalog", skip(self))]
    async fn fetch(&self, query: &CatalogQuery) -> Result<FeatureCollection, FetchError> {
        let response = self
            .request(query)
            .send()
            .await
            .map_err(FetchError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.bytes().await.map_err(FetchError::Request)?;
        let collection = parse_feature_collection(&body)?;
        tracing::info!(
            feature_count = collection.features.len(),
            "Received events from the earthquake catalog"
        );
        Ok(collection)
    }
}
