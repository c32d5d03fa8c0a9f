use crate::domain::EarthquakeRecord;
use chrono::{TimeZone, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct RawFeature {
    properties: RawProperties,
    geometry: RawGeometry,
}

#[derive(Deserialize)]
struct RawProperties {
    place: String,
    mag: f64,
    time: i64,
    url: String,
}

#[derive(Deserialize)]
struct RawGeometry {
    coordinates: Vec<f64>,
}

#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    #[error("Feature #{index} lacks a required property or carries one of the wrong type.")]
    MalformedFeature {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Feature #{index} does not carry a longitude/latitude pair.")]
    MissingCoordinates { index: usize },
    #[error("Feature #{index} has an out of range timestamp ({millis} ms).")]
    InvalidTime { index: usize, millis: i64 },
}

/// Maps raw catalog features onto records, one per feature and in the same
/// order. The first malformed feature fails the whole batch.
pub fn normalize(features: &[serde_json::Value]) -> Result<Vec<EarthquakeRecord>, NormalizeError> {
    features
        .iter()
        .enumerate()
        .map(|(index, feature)| normalize_feature(index, feature))
        .collect()
}

fn normalize_feature(
    index: usize,
    feature: &serde_json::Value,
) -> Result<EarthquakeRecord, NormalizeError> {
    let RawFeature {
        properties,
        geometry,
    } = RawFeature::deserialize(feature)
        .map_err(|source| NormalizeError::MalformedFeature { index, source })?;

    let (longitude, latitude) = match geometry.coordinates.as_slice() {
        [longitude, latitude, ..] => (*longitude, *latitude),
        _ => return Err(NormalizeError::MissingCoordinates { index }),
    };
    let occurred_at = Utc
        .timestamp_millis_opt(properties.time)
        .single()
        .ok_or(NormalizeError::InvalidTime {
            index,
            millis: properties.time,
        })?;

    Ok(EarthquakeRecord {
        place: properties.place,
        magnitude: properties.mag,
        occurred_at,
        latitude,
        longitude,
        detail_url: properties.url,
    })
}
