use chrono::{DateTime, Utc};

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One seismic event as shown in tables, exports and digests.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeRecord {
    pub place: String,
    pub magnitude: f64,
    pub occurred_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub detail_url: String,
}

impl EarthquakeRecord {
    pub fn formatted_time(&self) -> String {
        self.occurred_at.format(TIME_FORMAT).to_string()
    }
}
