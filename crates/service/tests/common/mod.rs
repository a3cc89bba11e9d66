//! Shared test utilities for service integration tests
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

use common::prelude::{Catalog, ContentStore, NodeRegistry};
use service::catalog::CatalogState;
use service::node::NodeState;

/// A catalog and two storage nodes on ephemeral ports, all in-process.
pub struct TestCluster {
    pub catalog: Url,
    pub nodes: Vec<Url>,
    pub catalog_state: CatalogState,
    shutdown_tx: watch::Sender<()>,
    handles: Vec<JoinHandle<()>>,
    _data: TempDir,
}

impl TestCluster {
    pub async fn start() -> Self {
        let data = TempDir::new().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let mut handles = Vec::new();

        let mut nodes = Vec::new();
        let mut listeners = Vec::new();
        for _ in 0..2 {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            nodes.push(Url::parse(&format!("http://{}", addr)).unwrap());
            listeners.push((listener, addr));
        }

        for (listener, addr) in listeners {
            let store = ContentStore::open(data.path().join(format!("node_{}", addr.port()))).unwrap();
            let state = NodeState::new(store, addr.port());
            let router = service::node::app(state, &http_config(addr));
            let rx = shutdown_rx.clone();
            handles.push(tokio::spawn(async move {
                service::http::serve(listener, router, rx).await.unwrap();
            }));
        }

        let addresses: Vec<String> = nodes
            .iter()
            .map(|url| url.as_str().trim_end_matches('/').to_string())
            .collect();
        let catalog_state = CatalogState::new(Catalog::new(), NodeRegistry::with_nodes(addresses));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = service::catalog::app(catalog_state.clone(), &http_config(addr));
        let rx = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            service::http::serve(listener, router, rx).await.unwrap();
        }));

        Self {
            catalog: Url::parse(&format!("http://{}", addr)).unwrap(),
            nodes,
            catalog_state,
            shutdown_tx,
            handles,
            _data: data,
        }
    }

    /// Address string the catalog has on record for node `i`.
    pub fn node_address(&self, i: usize) -> String {
        self.nodes[i].as_str().trim_end_matches('/').to_string()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for handle in self.handles {
            handle.await.unwrap();
        }
    }
}

fn http_config(addr: SocketAddr) -> service::http::Config {
    service::http::Config::new(addr, Duration::from_secs(5))
}
