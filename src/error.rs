//! Error type shared by the HTTP handlers.
//!
//! Every variant renders as `{"error": "<message>"}` with the matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::api::ErrorResponse;
use crate::groq::GroqError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing client input.
    #[error("{0}")]
    BadRequest(String),

    /// Request body larger than the relay accepts.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Anything else that went wrong while serving the request.
    #[error("{0}")]
    Internal(String),

    /// The LLM provider call failed for any reason.
    #[error(transparent)]
    Upstream(#[from] GroqError),

    /// A sub-application could not be reached.
    #[error("{0}")]
    BadGateway(String),

    /// A sub-application has no upstream configured.
    #[error("{0}")]
    Unavailable(String),

    #[error("Not found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
