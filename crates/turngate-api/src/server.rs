//! Router assembly and server lifecycle.
//!
//! The middleware stack, outermost first: request-id injection, tracing,
//! then per-request timeout. Handlers are synchronous glue over immutable
//! state, so shutdown has nothing to drain beyond in-flight requests.

use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::{handlers, AppState};

/// Builds the service router: credential issuance, the webhook receiver,
/// and the three orchestration probes, wrapped in the middleware stack.
///
/// `/turn-credentials` answers both GET and POST since WebRTC clients are
/// split on which they send.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let probes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check));

    let api = Router::new()
        .route(
            "/turn-credentials",
            get(handlers::issue_credentials).post(handlers::issue_credentials),
        )
        .route("/webhooks/stripe", post(handlers::receive_payment_webhook));

    probes
        .merge(api)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Tags every response with an `X-Request-Id` header and stores the same
/// id in request extensions for handlers that want to log it.
async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(id.clone());

    let mut response = next.run(req).await;
    if let Ok(value) = id.parse() {
        response.headers_mut().insert("X-Request-Id", value);
    }
    response
}

/// Binds `addr` and serves until SIGINT or SIGTERM arrives, then finishes
/// in-flight requests before returning.
///
/// # Errors
///
/// Propagates I/O errors from binding (port taken, interface missing) or
/// from the accept loop.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
    request_timeout: Duration,
) -> Result<(), std::io::Error> {
    let app = create_router(state, request_timeout);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("server stopped gracefully");
    Ok(())
}

/// Resolves when either SIGINT (development) or SIGTERM (orchestrators)
/// is delivered.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install SIGINT handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => tracing::error!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("received SIGINT, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
