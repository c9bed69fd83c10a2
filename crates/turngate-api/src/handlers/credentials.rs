//! Ephemeral relay credential endpoint.
//!
//! Thin HTTP shim over [`turngate_core::issue`]: reads the optional
//! `client_id` query parameter, takes the current time from the injected
//! clock, and maps domain errors to status codes. All credential logic
//! lives in the core crate.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};
use turngate_core::{credential, Clock, CoreError};

use crate::{handlers::error_response, AppState};

/// Query parameters for credential issuance.
#[derive(Debug, Deserialize)]
pub struct CredentialsQuery {
    /// Optional identifier scoping the credential to one client.
    pub client_id: Option<String>,
}

/// Issues a time-bounded relay credential set.
///
/// Responds 200 with `{urls, username, credential, ttl}`, 400 for a
/// malformed `client_id`, and 500 if the relay configuration turns out to
/// be unusable (normal startup validation makes that unreachable).
#[instrument(
    name = "issue_credentials",
    skip(state, query),
    fields(scoped = query.client_id.is_some())
)]
pub async fn issue_credentials(
    State(state): State<AppState>,
    Query(query): Query<CredentialsQuery>,
) -> Response {
    let now = state.clock.now_utc();

    match credential::issue(now, &state.relay, query.client_id.as_deref()) {
        Ok(issued) => {
            debug!(username = %issued.username, ttl = issued.ttl, "credential issued");
            (StatusCode::OK, Json(issued)).into_response()
        },
        Err(err @ CoreError::InvalidInput(_)) => {
            warn!(error = %err, "rejected credential request");
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        },
        Err(err @ CoreError::Configuration(_)) => {
            // Never echo configuration detail to the caller.
            error!(error = %err, "credential issuance failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "relay configuration invalid")
        },
    }
}
