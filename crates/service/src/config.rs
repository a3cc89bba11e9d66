use std::path::PathBuf;
use std::time::Duration;

use crate::imagegen::ImageGenConfig;

/// Default cap for a single uploaded file (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub const DEFAULT_CATALOG_PORT: u16 = 9000;
pub const DEFAULT_NODE_PORTS: [u16; 2] = [8001, 8002];

#[derive(Debug, Clone)]
pub struct Config {
    // catalog configuration
    /// port for the catalog service to listen on
    pub catalog_port: u16,
    /// whether this process runs the catalog service
    pub run_catalog: bool,
    /// per-request timeout on the catalog service
    pub catalog_request_timeout: Duration,
    /// upstream for the image generation proxy,
    ///  if not set the proxy endpoint answers 503
    pub imagegen: Option<ImageGenConfig>,

    // storage node configuration
    /// ports of the storage nodes. The catalog registers one node per
    ///  port at startup, whether or not this process runs them.
    pub node_ports: Vec<u16>,
    /// whether this process runs the storage nodes
    pub run_nodes: bool,
    /// host name used when advertising node addresses
    pub node_host: String,
    /// per-request timeout on the storage nodes
    pub node_request_timeout: Duration,
    /// largest accepted upload, in bytes
    pub max_file_size: usize,
    /// root directory; node `p` stores blobs under `data_dir/node_<p>`
    pub data_dir: PathBuf,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Address the catalog records for the node listening on `port`.
    pub fn node_address(&self, port: u16) -> String {
        format!("http://{}:{}", self.node_host, port)
    }

    pub fn node_addresses(&self) -> Vec<String> {
        self.node_ports
            .iter()
            .map(|port| self.node_address(*port))
            .collect()
    }

    pub fn node_dir(&self, port: u16) -> PathBuf {
        self.data_dir.join(format!("node_{}", port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_port: DEFAULT_CATALOG_PORT,
            run_catalog: true,
            catalog_request_timeout: Duration::from_secs(15),
            imagegen: None,
            node_ports: DEFAULT_NODE_PORTS.to_vec(),
            run_nodes: true,
            node_host: "localhost".to_string(),
            node_request_timeout: Duration::from_secs(30),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            data_dir: PathBuf::from("data"),
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_layout() {
        let config = Config {
            data_dir: PathBuf::from("/srv/minidrop"),
            ..Config::default()
        };

        assert_eq!(
            config.node_addresses(),
            vec!["http://localhost:8001", "http://localhost:8002"]
        );
        assert_eq!(
            config.node_dir(8002),
            PathBuf::from("/srv/minidrop/node_8002")
        );
    }
}
