//! Liveness, readiness, and health probes.
//!
//! Turngate has no external dependencies, so the only component worth
//! reporting on is the relay configuration itself. The checks re-assert
//! the invariants `RelayConfig` construction enforces, turning a
//! regression in config plumbing into a monitoring signal instead of
//! per-request 500s.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use turngate_core::{Clock, RelayConfig};

use crate::AppState;

/// Body of `/health` and `/ready` responses.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// Aggregate verdict across all checks.
    pub status: ServiceStatus,
    /// When the checks ran, per the injected clock.
    pub timestamp: DateTime<Utc>,
    /// Per-component results.
    pub checks: ComponentChecks,
    /// Crate version serving the request.
    pub version: String,
}

/// Aggregate service verdict.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Every check passed.
    Healthy,
    /// At least one check failed.
    Unhealthy,
}

/// The set of per-component checks this service runs.
#[derive(Debug, Serialize)]
pub struct ComponentChecks {
    /// Validity of the relay credential configuration.
    pub relay_config: CheckResult,
}

/// Outcome of a single component check.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    /// Pass or fail.
    pub status: CheckStatus,
    /// Failure detail, omitted when passing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Pass/fail marker for one component.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Component usable.
    Up,
    /// Component broken.
    Down,
}

fn check_relay_config(relay: &RelayConfig) -> CheckResult {
    if relay.shared_secret().is_empty() {
        return CheckResult {
            status: CheckStatus::Down,
            message: Some("shared secret is empty".to_string()),
        };
    }
    if relay.urls().is_empty() {
        return CheckResult {
            status: CheckStatus::Down,
            message: Some("no relay URLs configured".to_string()),
        };
    }

    CheckResult { status: CheckStatus::Up, message: None }
}

fn run_checks(state: &AppState) -> HealthReport {
    let relay_config = check_relay_config(&state.relay);

    let status = match relay_config.status {
        CheckStatus::Up => ServiceStatus::Healthy,
        CheckStatus::Down => ServiceStatus::Unhealthy,
    };

    HealthReport {
        status,
        timestamp: state.clock.now_utc(),
        checks: ComponentChecks { relay_config },
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// `GET /health` — full component report. 200 when healthy, 503 when a
/// check fails. Cheap enough for aggressive probe intervals.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let report = run_checks(&state);

    let code = match report.status {
        ServiceStatus::Healthy => StatusCode::OK,
        ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    debug!(status = ?report.status, "health check completed");

    (code, Json(report)).into_response()
}

/// `GET /ready` — the service is ready exactly when its configuration is
/// valid, so readiness reuses the health report.
#[instrument(name = "readiness_check", skip(state))]
pub async fn readiness_check(State(state): State<AppState>) -> Response {
    health_check(State(state)).await
}

/// `GET /live` — process-alive probe; deliberately skips every component
/// check.
#[instrument(name = "liveness_check", skip(state))]
pub async fn liveness_check(State(state): State<AppState>) -> Response {
    let body = serde_json::json!({
        "status": "alive",
        "timestamp": state.clock.now_utc(),
        "service": "turngate-api",
    });

    (StatusCode::OK, Json(body)).into_response()
}
