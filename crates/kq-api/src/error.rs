//! Unified API error type with Axum `IntoResponse` support.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// User-facing message for a missing, blank, or unreadable query body.
pub const NO_QUERY_MESSAGE: &str = "No query provided.";

/// API error type that converts to proper HTTP responses.
///
/// Only protocol-level failures live here. Validation, not-found and
/// upstream outcomes are conversational answers with status 200.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request carried no usable query text.
    #[error("No query provided.")]
    MalformedRequest,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MalformedRequest => StatusCode::BAD_REQUEST,
        };

        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience alias.
pub type ApiResult<T> = Result<T, ApiError>;
