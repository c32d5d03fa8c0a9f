mod catalog_query;
mod earthquake_record;
mod event_type;
mod magnitude;
mod new_subscriber;
mod sort_key;
mod subscriber_email;
mod subscription;

pub use catalog_query::{CatalogQuery, SubscriptionFilter};
pub use earthquake_record::{EarthquakeRecord, TIME_FORMAT};
pub use event_type::EventType;
pub use magnitude::{Magnitude, MAX_MAGNITUDE, MIN_MAGNITUDE};
pub use new_subscriber::NewSubscriber;
pub use sort_key::SortKey;
pub use subscriber_email::SubscriberEmail;
pub use subscription::Subscription;
