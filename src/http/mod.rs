use rocket::{Build, Rocket};

use crate::util::error::ApiErrorResponder;
use crate::DriftMinerState;

pub mod scores;

#[get("/health")]
fn health() -> &'static str {
    "Drift Miner Systems Operational"
}

#[catch(404)]
fn not_found() -> ApiErrorResponder {
    ApiErrorResponder::not_found()
}

#[catch(500)]
fn internal_error() -> ApiErrorResponder {
    ApiErrorResponder::internal_error()
}

pub fn build(state: DriftMinerState, port: u16) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", port));
    mount(rocket::custom(figment).manage(state))
}

pub fn mount(rocket_build: Rocket<Build>) -> Rocket<Build> {
    let rocket_build = rocket_build
        .mount("/", routes![health])
        .register("/", catchers![not_found, internal_error]);
    scores::mount(rocket_build)
}
