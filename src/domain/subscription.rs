use crate::domain::{EventType, Magnitude, SubscriberEmail, SubscriptionFilter};
use crate::models;

/// A stored subscription whose contact details and filter parsed cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub email: SubscriberEmail,
    pub filter: SubscriptionFilter,
    pub sent: bool,
}

impl TryFrom<models::Subscription> for Subscription {
    type Error = String;

    fn try_from(row: models::Subscription) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(row.email)?;
        let filter = SubscriptionFilter {
            min_magnitude: Magnitude::parse(row.min_magnitude)?,
            event_type: EventType::parse(&row.event_type)?,
        };
        Ok(Subscription {
            email,
            filter,
            sent: row.sent,
        })
    }
}
