use clap::Args;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Catalog listen port (default: 9000)
    #[arg(long)]
    pub catalog_port: Option<u16>,

    /// Storage node listen port; repeat for more nodes (default: 8001 and 8002)
    #[arg(long = "node-port")]
    pub node_ports: Vec<u16>,

    /// Host name used in the node addresses the catalog hands out
    #[arg(long)]
    pub node_host: Option<String>,

    /// Largest accepted upload in bytes (default: 10 MiB)
    #[arg(long)]
    pub max_file_size: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

impl Init {
    fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        if let Some(port) = self.catalog_port {
            config.catalog_port = port;
        }
        if !self.node_ports.is_empty() {
            config.node_ports = self.node_ports.clone();
        }
        if let Some(host) = &self.node_host {
            config.node_host = host.clone();
        }
        if let Some(max) = self.max_file_size {
            config.max_file_size = max;
        }
        config
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::init(ctx.config_path.clone(), Some(self.config()))?;

        let node_ports: Vec<String> = state
            .config
            .node_ports
            .iter()
            .map(|p| p.to_string())
            .collect();

        let output = format!(
            "Initialized minidrop directory at: {}\n\
             - Data: {}\n\
             - Logs: {}\n\
             - Config: {}\n\
             - Catalog port: {}\n\
             - Node ports: {}\n\
             - Node host: {}",
            state.minidrop_dir.display(),
            state.data_path.display(),
            state.logs_path.display(),
            state.config_path.display(),
            state.config.catalog_port,
            node_ports.join(", "),
            state.config.node_host,
        );

        Ok(output)
    }
}
