//! Error-to-HTTP response conversion.
//!
//! Every failing handler produces `{ "error": "<message>" }` with a non-2xx
//! status, matching what the UI's fetch-failure handling expects.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use reelgate_client::TmdbError;
use reelgate_core::Error;

/// A proxy/gateway error with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Missing required input at the proxy boundary.
    pub fn missing_input(message: &str) -> Self {
        Self::bad_request(message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.to_string() }
    }

    /// The server-held TMDB key is not configured.
    pub fn missing_api_key() -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: "Missing TMDB_API_KEY".to_string() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<TmdbError> for ApiError {
    fn from(err: TmdbError) -> Self {
        let status = match err {
            TmdbError::MissingApiKey => return ApiError::missing_api_key(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = %err, "TMDB request failed");
        Self { status, message: "Failed to reach TMDB".to_string() }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidInput(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Error::Fetch(_) | Error::FetchTimeout(_) | Error::CacheMiss(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
