//! Turngate HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use turngate_core::{Clock, RelayConfig};

pub mod config;
pub mod crypto;
pub mod handlers;
pub mod server;

pub use config::Config;
pub use server::{create_router, start_server};

/// Shared application state handed to every request handler.
///
/// Everything here is immutable after startup, so handlers can run
/// concurrently without coordination: the relay config and webhook
/// verifier are read-only, and the clock is the only injected capability.
#[derive(Clone)]
pub struct AppState {
    /// Validated relay configuration used for credential issuance.
    pub relay: Arc<RelayConfig>,
    /// Webhook signature policy.
    pub webhooks: Arc<crypto::WebhookVerifier>,
    /// Time source; tests substitute a deterministic clock.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Assembles application state from its validated parts.
    pub fn new(
        relay: Arc<RelayConfig>,
        webhooks: crypto::WebhookVerifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { relay, webhooks: Arc::new(webhooks), clock }
    }
}
