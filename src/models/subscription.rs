use crate::schema::subscriptions;
use diesel::prelude::*;

#[derive(Queryable, Debug, Clone, PartialEq)]
pub struct Subscription {
    pub email: String,
    pub min_magnitude: f32,
    pub event_type: String,
    pub sent: bool,
}

#[derive(Insertable)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscription<'a> {
    pub email: &'a str,
    pub min_magnitude: f32,
    pub event_type: &'a str,
    pub sent: bool,
}
