//! HTTP mapping of search failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pepsearch_core::SearchError;
use serde_json::json;

/// Each variant maps to one status code and a small JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// 400
    BadRequest(String),
    /// 404 for a missing resource
    NotFound(String),
    /// 404 `{"message": "No results found"}`; not a failure of the engine
    NoResults,
    /// 409
    Conflict(String),
    /// 503
    Unavailable(String),
    /// 500
    Internal(String),
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::InvalidQuery => ApiError::BadRequest("search_text is required".into()),
            SearchError::NotFound(_) => ApiError::NotFound(e.to_string()),
            SearchError::Busy => ApiError::Conflict(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NoResults => (StatusCode::NOT_FOUND, json!({ "message": "No results found" })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": msg })),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };
        (status, Json(body)).into_response()
    }
}
