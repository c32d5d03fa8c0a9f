//! HTML rendering shared by the frontend and the newsletter.

mod search;

pub use search::search_page;

use crate::domain::EarthquakeRecord;
use maud::{html, Markup, PreEscaped, DOCTYPE};

const LEAFLET_CSS_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.4.0/leaflet.css";
const LEAFLET_CSS_SHA512: &str = "sha512-puBpdR0798OZvTTbP4A8Ix/l+A4dHDD0DGqYW6RQ+9jxkRFclaxxQb/SJAWZfWAkuyeQUytO7+7N4QKrDh+drA==";
const LEAFLET_JS_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.4.0/leaflet.js";
const LEAFLET_JS_SHA512: &str = "sha512-QVftwZFqvtRNi0ZyCtsznlKSWOStnDORoefr1enyq5mVL4tmKB3S/EnC3rRJcxCPavG10IcrVGSmPh6Qw5lwrg==";
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const MAP_ZOOM: u8 = 5;

pub fn page(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1, shrink-to-fit=no";
                title { (title) }
                link
                    rel="stylesheet"
                    href=(LEAFLET_CSS_URL)
                    integrity=(LEAFLET_CSS_SHA512)
                    crossorigin="anonymous";
                script
                    src=(LEAFLET_JS_URL)
                    integrity=(LEAFLET_JS_SHA512)
                    crossorigin="anonymous" {}
            }
            body {
                (content)
            }
        }
    }
}

pub fn message_page(title: &str, message: &str) -> Markup {
    page(
        title,
        html! {
            h1 { (title) }
            p class="message" { (message) }
            p { a href="/earthquakes" { "Back to the search" } }
        },
    )
}

/// Anchor to an event's detail page. Anything that is not an absolute
/// http(s) URL is rendered as plain text instead of a link.
pub fn detail_link(url: &str) -> Markup {
    let is_web_url = reqwest::Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false);
    html! {
        @if is_web_url {
            a href=(url) target="_blank" rel="noopener noreferrer" { "More Info" }
        } @else {
            (url)
        }
    }
}

pub fn events_table<'a>(records: impl IntoIterator<Item = &'a EarthquakeRecord>) -> Markup {
    html! {
        table class="events" {
            thead {
                tr {
                    th { "Place" }
                    th { "Magnitude" }
                    th { "Time" }
                    th { "latitude" }
                    th { "longitude" }
                    th { "Details" }
                }
            }
            tbody {
                @for record in records {
                    tr {
                        td { (record.place) }
                        td { (record.magnitude) }
                        td { (record.formatted_time()) }
                        td { (record.latitude) }
                        td { (record.longitude) }
                        td { (detail_link(&record.detail_url)) }
                    }
                }
            }
        }
    }
}

/// Leaflet map with one circle per record, centered on the mean position.
pub fn scatter_map(element_id: &str, records: &[EarthquakeRecord], radius_meters: u32) -> Markup {
    let (lat, lng) = mean_position(records);
    let points: Vec<_> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "lat": r.latitude,
                "lng": r.longitude,
                "place": r.place,
                "magnitude": r.magnitude,
                "time": r.formatted_time(),
            })
        })
        .collect();
    // Inside a script element only `</script` can end the data early.
    let points = serde_json::Value::Array(points)
        .to_string()
        .replace('<', "\\u003c");

    let script = format!(
        r#"(function () {{
  var esc = function (s) {{
    return String(s).replace(/[&<>"']/g, function (c) {{
      return {{"&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#39;"}}[c];
    }});
  }};
  var points = {points};
  var map = L.map("{element_id}").setView([{lat}, {lng}], {zoom});
  L.tileLayer("{tiles}", {{ attribution: "&copy; OpenStreetMap contributors" }}).addTo(map);
  points.forEach(function (p) {{
    L.circle([p.lat, p.lng], {{ radius: {radius}, color: "rgb(200,30,0)", fillOpacity: 0.6 }})
      .bindTooltip("<b>Place:</b> " + esc(p.place) + "<br/><b>Magnitude:</b> " + esc(p.magnitude) + "<br/><b>Time:</b> " + esc(p.time))
      .addTo(map);
  }});
}})();"#,
        points = points,
        element_id = element_id,
        lat = lat,
        lng = lng,
        zoom = MAP_ZOOM,
        tiles = TILE_URL,
        radius = radius_meters,
    );

    html! {
        div id=(element_id) style="height:400px;" {}
        script { (PreEscaped(script)) }
    }
}

fn mean_position(records: &[EarthquakeRecord]) -> (f64, f64) {
    if records.is_empty() {
        return (0.0, 0.0);
    }
    let n = records.len() as f64;
    let lat = records.iter().map(|r| r.latitude).sum::<f64>() / n;
    let lng = records.iter().map(|r| r.longitude).sum::<f64>() / n;
    (lat, lng)
}
