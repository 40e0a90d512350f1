use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, Response};
use serde::Serialize;

pub struct JsonResponder<T: Serialize> {
    status: Status,
    value: T,
}

impl<T: Serialize> JsonResponder<T> {
    pub fn ok(value: T) -> Self {
        Self::from(value, Status::Ok)
    }

    pub fn from(value: T, status: Status) -> Self {
        JsonResponder { status, value }
    }
}

impl<'r, T: Serialize> Responder<'r, 'static> for JsonResponder<T> {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        Response::build_from(Json(self.value).respond_to(request)?)
            .status(self.status)
            .ok()
    }
}
