use crate::views;
use rocket::response::status::BadRequest;
use rocket::Request;

/// Rocket answers 422 when a form or query does not fit its guard; clients
/// get a plain 400 instead.
#[catch(422)]
pub fn unprocessable_entity_to_bad_request(req: &Request) -> BadRequest<maud::Markup> {
    tracing::warn!(uri = %req.uri(), "Rejected a malformed request");
    BadRequest(views::message_page(
        "Bad Request",
        "The submitted form is incomplete or malformed.",
    ))
}
