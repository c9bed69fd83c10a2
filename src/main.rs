//! Turngate relay credential service.
//!
//! Main entry point. Loads and validates configuration, then serves the
//! credential, webhook, and health endpoints until shutdown.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tracing::info;
use turngate_api::{server, AppState, Config};
use turngate_core::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("starting turngate relay credential service");

    // Fails fast: a missing shared secret never degrades into per-request
    // errors.
    let config = Config::load().context("failed to load configuration")?;
    let relay = Arc::new(config.relay_config().context("invalid relay configuration")?);
    let webhooks = config.webhook_verifier().context("invalid webhook configuration")?;
    let addr = config.parse_server_addr()?;

    info!(
        relay_urls = ?relay.urls(),
        credential_ttl_secs = relay.credential_ttl().as_secs(),
        webhook_verification = webhooks.requires_signature(),
        %addr,
        "configuration loaded"
    );

    let state = AppState::new(relay, webhooks, Arc::new(SystemClock));
    let request_timeout = Duration::from_secs(config.request_timeout);

    server::start_server(state, addr, request_timeout).await.context("server error")?;

    info!("turngate shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,turngate=debug,tower_http=debug"))
        .expect("invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
