use super::{events_table, page, scatter_map};
use crate::domain::{EventType, SortKey, SubscriptionFilter, MAX_MAGNITUDE, MIN_MAGNITUDE};
use crate::search::{earliest_start_date, EarthquakeSearch, QueryResults, TABLE_ROWS};
use chrono::NaiveDate;
use maud::{html, Markup};

const MAP_RADIUS_METERS: u32 = 50_000;

/// The search form, followed by the results when a search was run.
pub fn search_page(
    search: &EarthquakeSearch,
    today: NaiveDate,
    results: Option<&QueryResults>,
) -> Markup {
    page(
        "Earthquake Data Explorer",
        html! {
            h1 { "Earthquake Data Explorer" }
            (search_form(search, today))
            @if let Some(results) = results {
                hr;
                (results_section(results))
                hr;
                (subscribe_form(&results.search.filter))
            }
        },
    )
}

fn search_form(search: &EarthquakeSearch, today: NaiveDate) -> Markup {
    html! {
        form class="search" action="/earthquakes" method="GET" {
            label for="start" { "Start date" }
            input
                type="date"
                id="start"
                name="start"
                min=(earliest_start_date())
                max=(today)
                value=(search.start_date);
            label for="end" { "End date" }
            input
                type="date"
                id="end"
                name="end"
                min=(earliest_start_date())
                max=(today)
                value=(search.end_date);
            label for="min_magnitude" { "Minimum magnitude" }
            input
                type="number"
                id="min_magnitude"
                name="min_magnitude"
                min=(MIN_MAGNITUDE)
                max=(MAX_MAGNITUDE)
                step="0.1"
                value=(search.filter.min_magnitude);
            label for="event_type" { "Event type" }
            select id="event_type" name="event_type" {
                @for event_type in EventType::ALL {
                    option
                        value=(event_type.as_str())
                        selected[event_type == search.filter.event_type] {
                        (event_type.label())
                    }
                }
            }
            label for="sort_by" { "Sort by" }
            select id="sort_by" name="sort_by" {
                @for key in SortKey::ALL {
                    option value=(key.as_str()) selected[key == search.sort_by] { (key.as_str()) }
                }
            }
            input class="btn" type="submit" value="Fetch Data";
        }
    }
}

fn results_section(results: &QueryResults) -> Markup {
    let search = &results.search;
    let displayed = results.displayed();
    let export_url = format!("/earthquakes.csv?{}", search.query_string());
    html! {
        @if results.records.is_empty() {
            p { "No events found" }
        } @else {
            h2 { "Details" }
            p {
                (results.records.len()) " events found between "
                (search.start_date) " and " (search.end_date)
            }
            p { "Event type: " (search.filter.event_type.label()) }
            p {
                "Filtered by minimum of " (search.filter.min_magnitude)
                " magnitude on Richter scale."
            }
            p {
                a href=(export_url) download="events.csv" {
                    "Download Dataset"
                }
            }
            h2 { "Top 10 Events" }
            (events_table(displayed.iter().take(TABLE_ROWS)))
            h2 { "First 100 Events Visualized (Sorted)" }
            (scatter_map("events-map", &displayed, MAP_RADIUS_METERS))
        }
    }
}

fn subscribe_form(filter: &SubscriptionFilter) -> Markup {
    html! {
        h2 { "Subscribe to Mailing List" }
        form class="subscribe" action="/subscriptions" method="POST" {
            label for="email" {
                "Enter your email address to subscribe to daily earthquake updates"
            }
            input type="email" id="email" name="email" required;
            input type="hidden" name="min_magnitude" value=(filter.min_magnitude);
            input type="hidden" name="event_type" value=(filter.event_type.as_str());
            input class="btn" type="submit" value="Subscribe";
        }
    }
}
