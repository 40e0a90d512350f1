use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;

use crate::database::StoreContext;
use crate::DriftMinerState;

/// Each request gets its own deadline and a cancellation token tied to server shutdown.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for StoreContext {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        request
            .guard::<&State<DriftMinerState>>()
            .await
            .map(|state| state.store_context())
    }
}
