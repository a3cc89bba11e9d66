pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use common::prelude::{Catalog, ContentStore, ContentStoreError, NodeRegistry};

use crate::catalog::{self, CatalogState};
use crate::http;
use crate::imagegen::{ImageGenClient, ImageGenError};
use crate::node::{self, NodeState};
use crate::Config;

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
    #[error("failed to open store for node {port}: {source}")]
    Store {
        port: u16,
        #[source]
        source: ContentStoreError,
    },
    #[error("failed to build image generation client: {0}")]
    ImageGen(#[from] ImageGenError),
    #[error("nothing to run: both the catalog and the nodes are disabled")]
    NothingToRun,
}

/// Handle for gracefully shutting down the running services.
pub struct ShutdownHandle {
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Block until the services shut down (via signal or explicit shutdown).
    pub async fn wait(self) {
        shutdown_and_join(self.graceful_waiter, self.handles).await;
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
pub fn init_logging(config: &Config) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    // Stdout layer
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    // File layer (if log_dir is set)
    if let Some(log_dir) = &config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, "minidrop.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Wait for shutdown and join all handles with timeout.
async fn shutdown_and_join(
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    let _ = graceful_waiter.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}

fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], port))
}

fn catalog_state(config: &Config) -> Result<CatalogState, ProcessError> {
    let nodes = NodeRegistry::with_nodes(config.node_addresses());
    let mut state = CatalogState::new(Catalog::new(), nodes);
    match &config.imagegen {
        Some(imagegen) => {
            state = state.with_imagegen(ImageGenClient::new(imagegen.clone())?);
        }
        None => tracing::warn!("image generation is not configured; the proxy will answer 503"),
    }
    Ok(state)
}

fn node_states(config: &Config) -> Result<Vec<NodeState>, ProcessError> {
    config
        .node_ports
        .iter()
        .map(|&port| {
            let store = ContentStore::open(config.node_dir(port))
                .map_err(|source| ProcessError::Store { port, source })?;
            Ok(NodeState::new(store, port).with_max_file_size(config.max_file_size))
        })
        .collect()
}

/// Build state for every enabled service and spawn its listener.
///
/// Stores are opened before anything is spawned, so a bad data
///  directory fails here instead of inside a task.
/// The returned `ShutdownHandle` must be kept alive; dropping it does not stop the services.
pub async fn start_service(config: &Config) -> Result<ShutdownHandle, ProcessError> {
    if !config.run_catalog && !(config.run_nodes && !config.node_ports.is_empty()) {
        return Err(ProcessError::NothingToRun);
    }

    let catalog = if config.run_catalog {
        Some(catalog_state(config)?)
    } else {
        None
    };
    let nodes = if config.run_nodes {
        node_states(config)?
    } else {
        Vec::new()
    };

    let (graceful_waiter, shutdown_tx, shutdown_rx) =
        utils::graceful_shutdown_blocker().map_err(ProcessError::Signals)?;

    let mut handles = Vec::new();

    if let Some(state) = catalog {
        let http_config =
            http::Config::new(listen_addr(config.catalog_port), config.catalog_request_timeout)
                .with_log_level(config.log_level);
        let rx = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = catalog::run(http_config, state, rx).await {
                tracing::error!("Catalog server error: {}", e);
            }
        }));
    }

    for state in nodes {
        let port = state.port();
        let http_config = http::Config::new(listen_addr(port), config.node_request_timeout)
            .with_log_level(config.log_level);
        let rx = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = node::run(http_config, state, rx).await {
                tracing::error!(port, "Storage node error: {}", e);
            }
        }));
    }

    tracing::info!(
        catalog = config.run_catalog.then_some(config.catalog_port),
        nodes = ?config.run_nodes.then_some(&config.node_ports),
        "Running minidrop services"
    );

    Ok(ShutdownHandle {
        graceful_waiter,
        handles,
        shutdown_tx,
    })
}

/// Spawns the configured services and blocks until a shutdown signal
///  is received. Use for CLI binary usage.
pub async fn spawn_service(config: &Config) -> Result<(), ProcessError> {
    let _guards = init_logging(config);
    let handle = match start_service(config).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("error starting services: {}", e);
            return Err(e);
        }
    };
    handle.wait().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_nothing_to_run() {
        let config = Config {
            run_catalog: false,
            run_nodes: false,
            ..Config::default()
        };
        assert!(matches!(
            start_service(&config).await,
            Err(ProcessError::NothingToRun)
        ));
    }

    #[test]
    fn test_node_states_open_stores() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            node_ports: vec![18001, 18002],
            max_file_size: 1024,
            ..Config::default()
        };

        let states = node_states(&config).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[1].port(), 18002);
        assert_eq!(states[1].max_file_size(), 1024);
        assert!(dir.path().join("node_18001").is_dir());
        assert!(dir.path().join("node_18002").is_dir());
    }

    #[test]
    fn test_catalog_state_registers_nodes() {
        let config = Config {
            node_host: "storage.local".to_string(),
            ..Config::default()
        };

        let state = catalog_state(&config).unwrap();
        let addresses: Vec<String> = state
            .nodes()
            .list_nodes()
            .into_iter()
            .map(|node| node.address)
            .collect();
        assert_eq!(
            addresses,
            vec!["http://storage.local:8001", "http://storage.local:8002"]
        );
        assert!(state.imagegen().is_none());
    }
}
