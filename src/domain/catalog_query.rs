use crate::domain::{EventType, Magnitude};
use chrono::{DateTime, Duration, Utc};

/// The filter a subscriber saved, also used by interactive queries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubscriptionFilter {
    pub min_magnitude: Magnitude,
    pub event_type: EventType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filter: SubscriptionFilter,
}

impl CatalogQuery {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: SubscriptionFilter,
    ) -> Result<CatalogQuery, String> {
        if end < start {
            return Err(format!(
                "The end of the time range ({}) lies before its start ({}).",
                end, start
            ));
        }
        Ok(Self { start, end, filter })
    }

    /// The window `[now - period, now]`, used for periodic digests.
    pub fn for_period(
        now: DateTime<Utc>,
        period: Duration,
        filter: SubscriptionFilter,
    ) -> CatalogQuery {
        Self {
            start: now - period,
            end: now,
            filter,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn filter(&self) -> SubscriptionFilter {
        self.filter
    }
}
