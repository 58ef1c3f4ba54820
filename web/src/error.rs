use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;

/// Web-layer error mapped onto HTTP status codes.
#[derive(Debug)]
pub enum Error {
    /// The ingestion request body failed to parse as JSON. No fanout is
    /// attempted for such a call.
    MalformedPayload(serde_json::Error),
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::MalformedPayload(e) => {
                debug!("Rejected ingestion request with non-JSON body: {e}");
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY").into_response()
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err)
    }
}
