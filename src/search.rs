//! Request-scoped state of an interactive catalog search: the submitted form,
//! its validated interpretation and the records it produced.

use crate::domain::{
    CatalogQuery, EarthquakeRecord, EventType, Magnitude, SortKey, SubscriptionFilter,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// How many sorted records the result page works with.
pub const DISPLAY_LIMIT: usize = 100;
/// How many of those end up in the "Top 10 Events" table.
pub const TABLE_ROWS: usize = 10;
const DEFAULT_LOOKBACK_DAYS: i64 = 30;
const DATE_FORMAT: &str = "%Y-%m-%d";
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_');

/// Raw query string of `/earthquakes` and `/earthquakes.csv`.
#[derive(FromForm, Debug, Default)]
pub struct SearchForm {
    pub start: Option<String>,
    pub end: Option<String>,
    pub min_magnitude: Option<String>,
    pub event_type: Option<String>,
    pub sort_by: Option<String>,
}

impl SearchForm {
    fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.min_magnitude.is_none()
            && self.event_type.is_none()
            && self.sort_by.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeSearch {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub filter: SubscriptionFilter,
    pub sort_by: SortKey,
}

pub fn earliest_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl EarthquakeSearch {
    pub fn defaults(today: NaiveDate) -> Self {
        Self {
            start_date: today - Duration::days(DEFAULT_LOOKBACK_DAYS),
            end_date: today,
            filter: SubscriptionFilter::default(),
            sort_by: SortKey::default(),
        }
    }

    /// `Ok(None)` when no parameter was submitted at all; missing parameters
    /// otherwise fall back to the form defaults.
    pub fn parse(form: &SearchForm, today: NaiveDate) -> Result<Option<Self>, String> {
        if form.is_empty() {
            return Ok(None);
        }
        let defaults = Self::defaults(today);

        let start_date = match &form.start {
            Some(s) => parse_date(s)?,
            None => defaults.start_date,
        };
        let end_date = match &form.end {
            Some(s) => parse_date(s)?,
            None => defaults.end_date,
        };
        let min_magnitude = match &form.min_magnitude {
            Some(s) => Magnitude::parse(parse_number(s)?)?,
            None => defaults.filter.min_magnitude,
        };
        let event_type = form
            .event_type
            .as_deref()
            .map(EventType::parse)
            .transpose()?
            .unwrap_or(defaults.filter.event_type);
        let sort_by = form
            .sort_by
            .as_deref()
            .map(SortKey::parse)
            .transpose()?
            .unwrap_or(defaults.sort_by);

        if start_date < earliest_start_date() {
            return Err(format!(
                "The start date cannot lie before {}.",
                earliest_start_date()
            ));
        }
        if end_date > today {
            return Err("The end date cannot lie in the future.".into());
        }
        if end_date < start_date {
            return Err("Please enter valid end date.".into());
        }

        Ok(Some(Self {
            start_date,
            end_date,
            filter: SubscriptionFilter {
                min_magnitude,
                event_type,
            },
            sort_by,
        }))
    }

    /// Both dates are inclusive: the range ends at midnight after `end_date`.
    pub fn catalog_query(&self) -> Result<CatalogQuery, String> {
        let start = start_of_day(self.start_date)?;
        let end = self
            .end_date
            .succ_opt()
            .ok_or_else(|| format!("{} is out of range.", self.end_date))
            .and_then(start_of_day)?;
        CatalogQuery::new(start, end, self.filter)
    }

    /// Query string reproducing this search, e.g. for the CSV download link.
    pub fn query_string(&self) -> String {
        let params = [
            ("start", self.start_date.format(DATE_FORMAT).to_string()),
            ("end", self.end_date.format(DATE_FORMAT).to_string()),
            ("min_magnitude", self.filter.min_magnitude.to_string()),
            ("event_type", self.filter.event_type.as_str().to_string()),
            ("sort_by", self.sort_by.as_str().to_string()),
        ];
        params
            .iter()
            .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(value, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| format!("{} is not a date in the YYYY-MM-DD format.", s))
}

fn parse_number(s: &str) -> Result<f32, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("{} is not a magnitude.", s))
}

fn start_of_day(date: NaiveDate) -> Result<DateTime<Utc>, String> {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .ok_or_else(|| format!("{} has no midnight.", date))
}

pub struct QueryResults {
    pub search: EarthquakeSearch,
    /// Records in catalog order, as exported.
    pub records: Vec<EarthquakeRecord>,
}

impl QueryResults {
    /// The first [`DISPLAY_LIMIT`] records in the order the user asked for.
    pub fn displayed(&self) -> Vec<EarthquakeRecord> {
        let mut records = self.records.clone();
        self.search.sort_by.sort(&mut records);
        records.truncate(DISPLAY_LIMIT);
        records
    }
}
