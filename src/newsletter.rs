//! The periodic digest mailed to subscribers.

use crate::domain::EarthquakeRecord;
use crate::views::{events_table, page, scatter_map};
use maud::{html, Markup};
use std::collections::HashMap;

pub const DIGEST_SUBJECT: &str = "Daily Earthquake Newsletter";
const USGS_MAP_URL: &str = "https://earthquake.usgs.gov/earthquakes/map/";
const TOP_EVENTS: usize = 10;
const MAP_RADIUS_METERS: u32 = 10_000;

#[derive(thiserror::Error, Debug)]
#[error("Cannot build a digest without any earthquake records.")]
pub struct EmptyDigest;

/// Summary of one period's records. Always built from at least one record.
#[derive(Debug)]
pub struct Digest<'a> {
    records: &'a [EarthquakeRecord],
    top_events: Vec<&'a EarthquakeRecord>,
    strongest: &'a EarthquakeRecord,
    most_affected_region: &'a str,
}

impl<'a> Digest<'a> {
    pub fn new(records: &'a [EarthquakeRecord]) -> Result<Self, EmptyDigest> {
        let first = records.first().ok_or(EmptyDigest)?;

        let mut top_events: Vec<&EarthquakeRecord> = records.iter().collect();
        top_events.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        top_events.truncate(TOP_EVENTS);

        let strongest = records.iter().fold(first, |best, record| {
            if record.magnitude > best.magnitude {
                record
            } else {
                best
            }
        });

        Ok(Self {
            records,
            top_events,
            strongest,
            most_affected_region: most_frequent_place(records),
        })
    }

    /// Up to ten records, strongest first. Ties keep their catalog order.
    pub fn top_events(&self) -> &[&'a EarthquakeRecord] {
        &self.top_events
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// The first record carrying the maximum magnitude.
    pub fn strongest(&self) -> &'a EarthquakeRecord {
        self.strongest
    }

    /// The most frequent place; among equally frequent places the one seen first.
    pub fn most_affected_region(&self) -> &'a str {
        self.most_affected_region
    }

    pub fn to_html(&self) -> Markup {
        let strongest = self.strongest;
        page(
            DIGEST_SUBJECT,
            html! {
                h1 { (DIGEST_SUBJECT) }
                p { "Here is your daily update on earthquake activity:" }

                h2 { "Summary Table (Top 10 by Magnitude)" }
                (events_table(self.top_events.iter().copied()))

                h2 { "Key Statistics" }
                ul {
                    li { strong { "Total Earthquakes:" } " " (self.total()) }
                    li {
                        strong { "Strongest Earthquake:" } " "
                        (strongest.magnitude) " magnitude at " (strongest.place)
                        " on " (strongest.formatted_time())
                    }
                    li { strong { "Most Affected Region:" } " " (self.most_affected_region) }
                }

                h2 { "Map Visualization" }
                (scatter_map("digest-map", self.records, MAP_RADIUS_METERS))
                p {
                    "Map not showing? "
                    a href=(self.usgs_map_url()) { "View these events on the USGS map" }
                    "."
                }

                h2 { "More Information" }
                p {
                    "For more details, visit the "
                    a href=(USGS_MAP_URL) { "USGS Earthquake Map" }
                    "."
                }
            },
        )
    }

    /// USGS map zoomed to the bounding box of the digest's records. Mail clients
    /// drop the Leaflet scripts, so this is the map most recipients can open.
    pub fn usgs_map_url(&self) -> String {
        let (mut south, mut west) = (f64::MAX, f64::MAX);
        let (mut north, mut east) = (f64::MIN, f64::MIN);
        for record in self.records {
            south = south.min(record.latitude);
            north = north.max(record.latitude);
            west = west.min(record.longitude);
            east = east.max(record.longitude);
        }
        format!(
            "{}?extent={},{}&extent={},{}",
            USGS_MAP_URL, south, west, north, east
        )
    }

    /// Plain-text alternative for mail clients that do not render HTML.
    pub fn to_text(&self) -> String {
        let mut text = format!(
            "{}\n\nHere is your daily update on earthquake activity.\n\nTop 10 by Magnitude\n",
            DIGEST_SUBJECT
        );
        for record in &self.top_events {
            text.push_str(&format!(
                "- M {} | {} | {} | {}\n",
                record.magnitude,
                record.place,
                record.formatted_time(),
                record.detail_url
            ));
        }
        text.push_str(&format!("\nMap of these events: {}\n", self.usgs_map_url()));
        text.push_str(&format!(
            "\nKey Statistics\nTotal Earthquakes: {}\nStrongest Earthquake: {} magnitude at {} on {}\nMost Affected Region: {}\n\nFor more details, visit the USGS Earthquake Map: {}\n",
            self.total(),
            self.strongest.magnitude,
            self.strongest.place,
            self.strongest.formatted_time(),
            self.most_affected_region,
            USGS_MAP_URL
        ));
        text
    }
}

fn most_frequent_place(records: &[EarthquakeRecord]) -> &str {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.place.as_str()).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for record in records {
        let count = counts[record.place.as_str()];
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((record.place.as_str(), count));
        }
    }
    best.map(|(place, _)| place).unwrap_or_default()
}
