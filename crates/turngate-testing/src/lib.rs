//! Test infrastructure for deterministic turngate testing.
//!
//! Provides a ready-made application state with a pinned clock and known
//! secrets, plus reference signing fixtures implemented independently of
//! the production crypto paths. Integration tests drive the router with
//! `tower::ServiceExt::oneshot`; nothing here touches the network.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use axum::{response::Response, Router};
use turngate_api::{create_router, crypto::WebhookVerifier, AppState};
use turngate_core::{RelayConfig, SharedSecret};

pub mod fixtures;

pub use turngate_core::TestClock;

/// Shared secret every test environment issues credentials with.
pub const TURN_SECRET: &str = "test-shared-secret";

/// Webhook signing secret for test environments with verification on.
pub const STRIPE_SECRET: &str = "whsec_test";

/// Unix timestamp the test clock starts at (2023-11-14T22:13:20Z).
pub const TEST_EPOCH: i64 = 1_700_000_000;

/// Credential lifetime used by test environments.
pub const TEST_TTL_SECS: u64 = 600;

const TEST_TOLERANCE: Duration = Duration::from_secs(300);
const TEST_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Test environment with deterministic time and known configuration.
///
/// The clock is shared with the application state, so advancing it from a
/// test changes what handlers observe.
pub struct TestEnv {
    /// Deterministic clock injected into the handlers.
    pub clock: TestClock,
    relay: Arc<RelayConfig>,
    webhook_secret: Option<&'static str>,
}

impl TestEnv {
    /// Creates an environment with webhook verification enabled.
    pub fn new() -> Self {
        Self::build(Some(STRIPE_SECRET))
    }

    /// Creates an environment that accepts unverified webhooks.
    pub fn without_webhook_secret() -> Self {
        Self::build(None)
    }

    fn build(webhook_secret: Option<&'static str>) -> Self {
        let relay = RelayConfig::new(
            SharedSecret::from(TURN_SECRET),
            vec![
                "turn:turn.test.example:3478".to_string(),
                "turns:turn.test.example:5349".to_string(),
            ],
            Duration::from_secs(TEST_TTL_SECS),
        )
        .expect("test relay config is valid");

        Self { clock: TestClock::at(TEST_EPOCH), relay: Arc::new(relay), webhook_secret }
    }

    /// Relay configuration the environment issues credentials with.
    pub fn relay(&self) -> &RelayConfig {
        &self.relay
    }

    /// Application state wired to this environment's clock and config.
    pub fn state(&self) -> AppState {
        let verifier = WebhookVerifier::new(
            self.webhook_secret.map(SharedSecret::from),
            TEST_TOLERANCE,
        );
        AppState::new(self.relay.clone(), verifier, Arc::new(self.clock.clone()))
    }

    /// Full router as served in production, minus the listener.
    pub fn router(&self) -> Router {
        create_router(self.state(), TEST_REQUEST_TIMEOUT)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a response body to completion and parses it as JSON.
///
/// # Panics
///
/// Panics when the body cannot be read or is not valid JSON; tests want
/// that to fail loudly.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}
