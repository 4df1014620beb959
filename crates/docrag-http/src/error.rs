use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use docrag_core::error::Error;

/// Every failure leaves the service as `{"ok": false, "error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self { Self(Error::InvalidInput(message.into())) }

    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidInput(_) | Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "ok": false, "error": self.0.to_string() }))).into_response()
    }
}
