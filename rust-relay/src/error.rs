//! Error types for the relay.
//!
//! [`RelayError`] covers failures the original caller can observe.
//! [`DeliveryError`] only ever exists in the background phase and ends up in
//! a [`RelayOutcome`](crate::relay::RelayOutcome) and the logs.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Synchronous failures returned to the webhook caller.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("method {0} is not supported")]
    UnsupportedMethod(Method),

    #[error("DOWNSTREAM_URL is not configured")]
    MissingConfiguration,

    #[error("invalid downstream configuration: {0}")]
    InvalidConfiguration(String),

    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

/// JSON error body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::MissingConfiguration | RelayError::InvalidConfiguration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::BodyRead(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            RelayError::UnsupportedMethod(_) => (status, "Method Not Allowed").into_response(),
            RelayError::MissingConfiguration | RelayError::InvalidConfiguration(_) => (
                status,
                Json(ErrorResponse {
                    status: "misconfigured",
                    message: self.to_string(),
                }),
            )
                .into_response(),
            RelayError::PayloadTooLarge(_) | RelayError::BodyRead(_) => (
                status,
                Json(ErrorResponse {
                    status: "rejected",
                    message: self.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// Background delivery failures. Never propagated to the caller.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("hop timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unusable redirect location: {0}")]
    InvalidLocation(String),

    #[error("redirect limit of {0} hops reached")]
    RedirectLimit(u32),

    #[error("redirect status {0} without a Location header")]
    RedirectWithoutLocation(u16),

    #[error("collector answered with status {0}")]
    UpstreamStatus(u16),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::Timeout
        } else {
            DeliveryError::Network(err.to_string())
        }
    }
}
