use crate::startup::QuakesDbConn;
use crate::store::{self, SubscribeError};
use crate::views;
use diesel::PgConnection;
use maud::Markup;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::Request;
use uuid::Uuid;

const PAGE_TITLE: &str = "Subscribe to Mailing List";

#[derive(FromForm)]
pub struct FormData {
    email: String,
    min_magnitude: f32,
    event_type: String,
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(form, conn),
    fields(
        request_id = %Uuid::new_v4(),
        subscriber_email = %form.email,
        min_magnitude = %form.min_magnitude,
        event_type = %form.event_type
    )
)]
#[post("/subscriptions", data = "<form>")]
pub async fn subscribe(form: Form<FormData>, conn: QuakesDbConn) -> Result<Markup, SubscribeError> {
    let FormData {
        email,
        min_magnitude,
        event_type,
    } = form.into_inner();
    conn.run(move |c: &mut PgConnection| {
        store::subscribe(c, email, min_magnitude, &event_type)
    })
    .await?;
    Ok(views::message_page(
        PAGE_TITLE,
        "You have been successfully subscribed!",
    ))
}

impl<'r> Responder<'r, 'static> for SubscribeError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::warn!(error.cause_chain = ?self, "Subscription request rejected");
        let (status, message) = match &self {
            SubscribeError::InvalidEmail(_) => (
                Status::BadRequest,
                "Please enter a valid email address.".to_string(),
            ),
            SubscribeError::InvalidFilter(message) => (Status::BadRequest, message.clone()),
            SubscribeError::DuplicateSubscription => (Status::Conflict, self.to_string()),
            SubscribeError::Store(_) => (
                Status::InternalServerError,
                "Failed to save your subscription. Please try again later.".to_string(),
            ),
        };
        (status, views::message_page(PAGE_TITLE, &message)).respond_to(request)
    }
}
