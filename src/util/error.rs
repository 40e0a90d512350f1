use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, Response};
use serde::Serialize;

use crate::leaderboard::SubmissionError;

#[derive(Serialize, Debug)]
pub struct ApiError {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiErrorResponder {
    pub status: Status,
    pub body: ApiError,
}

impl ApiErrorResponder {
    fn create(status: Status, error: &'static str, message: impl Into<String>) -> Self {
        ApiErrorResponder { status, body: ApiError { error, message: message.into() } }
    }

    pub fn invalid_json() -> Self {
        Self::create(Status::BadRequest, "INVALID_JSON", "Invalid JSON")
    }

    pub fn not_found() -> Self {
        Self::create(Status::NotFound, "NOT_FOUND", "Not found")
    }

    pub fn internal_error() -> Self {
        Self::create(Status::InternalServerError, "INTERNAL_ERROR", "Internal Server Error")
    }
}

impl From<SubmissionError> for ApiErrorResponder {
    fn from(error: SubmissionError) -> Self {
        match error {
            SubmissionError::InvalidUsername => Self::create(Status::BadRequest, "INVALID_USERNAME", error.to_string()),
            SubmissionError::InvalidScore => Self::create(Status::BadRequest, "INVALID_SCORE", error.to_string()),
            SubmissionError::InvalidUserId => Self::create(Status::BadRequest, "INVALID_USER_ID", error.to_string()),
            SubmissionError::InvalidLimit => Self::create(Status::BadRequest, "INVALID_LIMIT", error.to_string()),
            // store causes stay in the logs
            SubmissionError::Persistence(_) => Self::internal_error(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiErrorResponder {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        Response::build_from(Json(self.body).respond_to(request)?)
            .status(self.status)
            .ok()
    }
}
