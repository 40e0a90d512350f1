pub mod auth;
pub mod error;
pub mod request;
pub mod responder;
pub mod time;
pub mod validation;
