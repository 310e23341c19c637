pub mod analytics;
pub mod autofill;
pub mod complaint;
pub mod form;
pub mod health;
pub mod mail;
pub mod user;
pub mod worker;

use axum::extract::{FromRequest, FromRequestParts};
use uuid::Uuid;

use crate::error::ComplaintsServiceError;

/// Parse a path id. Malformed ids are a client error, not a miss.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ComplaintsServiceError> {
    raw.parse()
        .map_err(|_| ComplaintsServiceError::validation(format!("invalid id: {raw}")))
}

/// `Json` whose rejections render as [`ComplaintsServiceError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ComplaintsServiceError))]
pub struct AppJson<T>(pub T);

/// `Query` whose rejections render as [`ComplaintsServiceError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ComplaintsServiceError))]
pub struct AppQuery<T>(pub T);
