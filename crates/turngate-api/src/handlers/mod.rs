//! HTTP request handlers for the turngate API.
//!
//! Handlers follow a consistent pattern:
//! - input validation with appropriate status codes
//! - tracing for observability
//! - standardized error responses
//!
//! # Error Handling
//!
//! Error responses always carry the stable shape `{"error": "<message>"}`;
//! internal detail (configuration values, digest material, stack state)
//! never reaches the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub mod credentials;
pub mod health;
pub mod webhook;

// Re-export handlers for convenient access
pub use credentials::issue_credentials;
pub use health::{health_check, liveness_check, readiness_check};
pub use webhook::receive_payment_webhook;

/// Stable error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub error: String,
}

/// Creates a standardized error response.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}
