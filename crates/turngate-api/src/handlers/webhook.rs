//! Payment webhook receiver.
//!
//! Authenticates incoming provider webhooks against the configured signing
//! secret, parses the event envelope, and acknowledges. Turngate does not
//! act on payment events; downstream processing is out of scope, so the
//! contract here is authenticate-then-acknowledge.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument, warn};
use turngate_core::Clock;

use crate::{handlers::error_response, AppState};

/// Largest accepted webhook payload.
const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Header carrying the provider signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Acknowledgement returned for accepted webhooks.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// Always `true`; the provider only checks for a 2xx with this shape.
    pub received: bool,
}

/// Receives a payment provider webhook.
///
/// Responds 200 `{received: true}` for authenticated payloads, 400 for
/// signature or parse failures, and 413 for oversized bodies. Rejected
/// requests have no side effects.
#[instrument(
    name = "receive_payment_webhook",
    skip(state, headers, body),
    fields(payload_size = body.len())
)]
pub async fn receive_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.len() > MAX_PAYLOAD_SIZE {
        warn!(payload_size = body.len(), limit = MAX_PAYLOAD_SIZE, "payload exceeds size limit");
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "webhook payload too large");
    }

    if state.webhooks.requires_signature() {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

        if let Err(err) = state.webhooks.verify(&body, signature, state.clock.now_utc()) {
            warn!(error = %err, "webhook signature rejected");
            return error_response(StatusCode::BAD_REQUEST, err.to_string());
        }
    } else {
        warn!("no webhook signing secret configured, accepting unverified payload");
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(_) => {
            warn!("webhook payload is not valid JSON");
            return error_response(StatusCode::BAD_REQUEST, "webhook payload is not valid JSON");
        },
    };

    let event_type = event.get("type").and_then(serde_json::Value::as_str).unwrap_or("unknown");
    let event_id = event.get("id").and_then(serde_json::Value::as_str).unwrap_or("unknown");
    info!(event_type, event_id, "payment webhook received");

    (StatusCode::OK, Json(WebhookAck { received: true })).into_response()
}
