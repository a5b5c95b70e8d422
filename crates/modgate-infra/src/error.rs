//! HTTP error response body
//!
//! The `IntoResponse` conversion for `AppError` lives in the api crate: the
//! orphan rule forbids implementing axum's trait for a core type here.

use serde::Serialize;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}
