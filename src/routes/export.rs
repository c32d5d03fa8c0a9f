use crate::catalog::Catalog;
use crate::domain::EarthquakeRecord;
use crate::routes::{run_search, QueryError};
use crate::search::{EarthquakeSearch, SearchForm};
use chrono::Utc;
use rocket::http::{ContentType, Header};
use rocket::State;
use std::sync::Arc;
use uuid::Uuid;

const CSV_HEADER: [&str; 6] = ["Place", "Magnitude", "Time", "latitude", "longitude", "Details"];

#[derive(Debug, serde::Serialize)]
struct CsvRecord<'a> {
    place: &'a str,
    magnitude: f64,
    time: String,
    latitude: f64,
    longitude: f64,
    details: &'a str,
}

impl<'a> From<&'a EarthquakeRecord> for CsvRecord<'a> {
    fn from(record: &'a EarthquakeRecord) -> Self {
        CsvRecord {
            place: &record.place,
            magnitude: record.magnitude,
            time: record.formatted_time(),
            latitude: record.latitude,
            longitude: record.longitude,
            details: &record.detail_url,
        }
    }
}

/// Records in the order given, headed by the column names even when empty.
pub fn to_csv(records: &[EarthquakeRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.serialize(CsvRecord::from(record))?;
    }
    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[derive(Responder)]
pub struct CsvDownload {
    inner: (ContentType, Vec<u8>),
    disposition: Header<'static>,
}

impl CsvDownload {
    fn new(data: Vec<u8>) -> Self {
        CsvDownload {
            inner: (ContentType::CSV, data),
            disposition: Header::new("Content-Disposition", "attachment; filename=\"events.csv\""),
        }
    }
}

#[tracing::instrument(
    name = "Export earthquakes as CSV",
    skip(search, catalog),
    fields(request_id = %Uuid::new_v4())
)]
#[get("/earthquakes.csv?<search..>")]
pub async fn export_csv(
    search: SearchForm,
    catalog: &State<Arc<dyn Catalog>>,
) -> Result<CsvDownload, QueryError> {
    let today = Utc::now().date_naive();
    let search = EarthquakeSearch::parse(&search, today)
        .map_err(QueryError::InvalidInput)?
        .unwrap_or_else(|| EarthquakeSearch::defaults(today));
    let results = run_search(catalog.inner().as_ref(), search).await?;
    Ok(CsvDownload::new(to_csv(&results.records)?))
}
