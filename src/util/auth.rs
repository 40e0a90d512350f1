use std::convert::Infallible;

use rocket::request::{FromRequest, Outcome, Request};

use crate::util::validation::is_blank;

pub const VERIFIED_USER_HEADER: &str = "X-Verified-User-Id";

/// User id asserted by the identity-aware gateway in front of the API, if any.
pub struct VerifiedUser(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for VerifiedUser {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user_id = request
            .headers()
            .get_one(VERIFIED_USER_HEADER)
            .filter(|value| !is_blank(value))
            .map(str::to_owned);
        Outcome::Success(VerifiedUser(user_id))
    }
}
