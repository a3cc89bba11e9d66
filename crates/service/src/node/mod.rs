//! Storage node service: upload / retrieve / health over one [`ContentStore`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use common::prelude::ContentStore;

use crate::http::health::{DataSource, DataSourceError};
use crate::http::{self, HttpServerError, STATUS_PREFIX};

pub mod health;
pub mod retrieve;
pub mod upload;

pub use retrieve::RetrieveRequest;
pub use upload::UploadRequest;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct NodeState {
    store: Arc<ContentStore>,
    port: u16,
    max_file_size: usize,
}

impl NodeState {
    pub fn new(store: ContentStore, port: u16) -> Self {
        Self {
            store: Arc::new(store),
            port,
            max_file_size: crate::config::DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }
}

#[async_trait]
impl DataSource for NodeState {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        match tokio::fs::try_exists(self.store.dir()).await {
            Ok(true) => Ok(()),
            _ => Err(DataSourceError::DependencyFailure),
        }
    }
}

pub fn router(state: NodeState) -> Router<NodeState> {
    Router::new()
        .route("/upload", post(upload::handler))
        .route("/retrieve", get(retrieve::handler))
        .route("/health", get(health::handler))
        .with_state(state)
}

/// The complete node application: service routes, status routes and
///  the shared layers.
pub fn app(state: NodeState, config: &http::Config) -> Router {
    let body_limit = state.max_file_size() + MULTIPART_OVERHEAD;
    Router::new()
        .nest(STATUS_PREFIX, http::health::router(state.clone()))
        .merge(router(state.clone()))
        .fallback(http::not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            config.request_timeout,
            http::timeout::middleware,
        ))
        .with_state(state)
        .layer(http::trace_layer(config.log_level))
}

/// Run a storage node until `shutdown_rx` fires.
pub async fn run(
    config: http::Config,
    state: NodeState,
    shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = ?config.listen_addr,
        dir = %state.store().dir().display(),
        "storage node listening"
    );
    http::serve(listener, app(state, &config), shutdown_rx).await
}
