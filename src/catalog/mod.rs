//! Access to the public earthquake catalog.
//!
//! [`Catalog`] is the seam between the rest of the application and the
//! upstream FDSN event service: [`UsgsCatalog`] talks to the real API, tests
//! plug in their own implementation. Whatever the source, the answer is a raw
//! [`FeatureCollection`] that [`normalize`] turns into records.

mod normalize;
mod usgs_client;

pub use normalize::{normalize, NormalizeError};
pub use usgs_client::UsgsCatalog;

use crate::domain::CatalogQuery;
use async_trait::async_trait;

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn fetch(&self, query: &CatalogQuery) -> Result<FeatureCollection, FetchError>;
}

/// A GeoJSON `FeatureCollection` with its features left unparsed.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<serde_json::Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Failed to reach the earthquake catalog.")]
    Request(#[source] reqwest::Error),
    #[error("The earthquake catalog answered with status {0}.")]
    Status(reqwest::StatusCode),
    #[error("The earthquake catalog did not answer with a GeoJSON feature collection.")]
    Payload(#[from] serde_json::Error),
}

pub fn parse_feature_collection(body: &[u8]) -> Result<FeatureCollection, FetchError> {
    Ok(serde_json::from_slice(body)?)
}
