use crate::domain::{SubscriberEmail, SubscriptionFilter};

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub filter: SubscriptionFilter,
}
