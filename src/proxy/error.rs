//! JSON error responses for the cover endpoints.

use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use crate::covers::CoverError;

/// Builder for standardized error responses
pub struct ErrorResponse;

impl ErrorResponse {
    /// Create a JSON error response from a CoverError
    pub fn from_error(err: &CoverError, request_id: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "type": err.error_type(),
                "message": err.to_string(),
                "request_id": request_id
            }
        });

        (
            err.status_code(),
            [(CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
