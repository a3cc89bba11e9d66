//! HTTP plumbing shared by the node and catalog services.

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

pub mod config;
pub mod error;
mod handlers;
pub mod health;
pub mod timeout;

pub use config::Config;
pub use error::{error_response, ErrorBody, ErrorKind};
pub use handlers::not_found_handler;

pub const STATUS_PREFIX: &str = "/_status";

/// Request tracing with responses logged at `log_level`.
pub fn trace_layer(
    log_level: tracing::Level,
) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros))
}

/// Serve `router` on an already bound listener until `shutdown_rx` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
