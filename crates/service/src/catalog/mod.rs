//! Catalog service: fingerprint registration and lookup, the node
//! table, and the image generation proxy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use common::prelude::{Catalog, NodeRegistry};

use crate::http::health::{DataSource, DataSourceError};
use crate::http::{self, HttpServerError, STATUS_PREFIX};
use crate::imagegen::ImageGenClient;

pub mod generate;
pub mod get;
pub mod list;
pub mod nodes;
pub mod register;

pub use generate::GenerateRequest;
pub use get::GetRequest;
pub use list::ListRequest;
pub use nodes::NodesRequest;
pub use register::RegisterRequest;

#[derive(Clone)]
pub struct CatalogState {
    catalog: Arc<Catalog>,
    nodes: Arc<NodeRegistry>,
    imagegen: Option<Arc<ImageGenClient>>,
    upstream_deadline: Option<Duration>,
}

impl CatalogState {
    pub fn new(catalog: Catalog, nodes: NodeRegistry) -> Self {
        Self {
            catalog: Arc::new(catalog),
            nodes: Arc::new(nodes),
            imagegen: None,
            upstream_deadline: None,
        }
    }

    pub fn with_imagegen(mut self, client: ImageGenClient) -> Self {
        self.imagegen = Some(Arc::new(client));
        self
    }

    /// Cap on how long the proxy waits for the image API, on top of the
    ///  client's own timeout.
    pub fn with_upstream_deadline(mut self, deadline: Duration) -> Self {
        self.upstream_deadline = Some(deadline);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn imagegen(&self) -> Option<&ImageGenClient> {
        self.imagegen.as_deref()
    }

    pub fn upstream_deadline(&self) -> Option<Duration> {
        self.upstream_deadline
    }
}

#[async_trait]
impl DataSource for CatalogState {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        // everything lives in memory
        Ok(())
    }
}

pub fn router(state: CatalogState) -> Router<CatalogState> {
    Router::new()
        .route("/register", post(register::handler))
        .route("/get", get(get::handler))
        .route("/list", get(list::handler))
        .route("/nodes", get(nodes::handler))
        .route("/imagegen/generate", post(generate::handler))
        .with_state(state)
}

/// The complete catalog application: service routes, status routes and
///  the shared layers. The image proxy gets three quarters of the request
///  timeout so an upstream stall is reported before the request expires.
pub fn app(state: CatalogState, config: &http::Config) -> Router {
    let state = match state.upstream_deadline {
        Some(_) => state,
        None => state.with_upstream_deadline(config.request_timeout * 3 / 4),
    };
    Router::new()
        .nest(STATUS_PREFIX, http::health::router(state.clone()))
        .merge(router(state.clone()))
        .fallback(http::not_found_handler)
        .layer(DefaultBodyLimit::max(generate::FORM_LIMIT))
        .layer(middleware::from_fn_with_state(
            config.request_timeout,
            http::timeout::middleware,
        ))
        .with_state(state)
        .layer(http::trace_layer(config.log_level))
}

/// Run the catalog until `shutdown_rx` fires.
pub async fn run(
    config: http::Config,
    state: CatalogState,
    shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = ?config.listen_addr,
        nodes = state.nodes().list_nodes().len(),
        "catalog listening"
    );
    http::serve(listener, app(state, &config), shutdown_rx).await
}
