use clap::Args;
use url::Url;

use service::imagegen::{ImageGenConfig, API_KEY_ENV};
use service::process::ProcessError;
use service::{spawn_service, Config};

use crate::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Run only the catalog service
    #[arg(long, conflicts_with = "nodes_only")]
    pub catalog_only: bool,

    /// Run only the storage nodes
    #[arg(long)]
    pub nodes_only: bool,

    /// Log level for stdout and the log file (RUST_LOG overrides)
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Also write daily log files under the minidrop directory
    #[arg(long)]
    pub log_to_file: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] crate::state::StateError),

    #[error("invalid image generation endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("daemon failed: {0}")]
    Failed(#[from] ProcessError),
}

impl Daemon {
    fn service_config(&self, state: AppState) -> Result<Config, DaemonError> {
        let endpoint = Url::parse(&state.config.imagegen_endpoint)?;
        let imagegen = ImageGenConfig::from_env(endpoint);
        if imagegen.is_none() && !self.nodes_only {
            eprintln!(
                "Note: {} is not set; image generation requests will be refused",
                API_KEY_ENV
            );
        }

        Ok(Config {
            catalog_port: state.config.catalog_port,
            run_catalog: !self.nodes_only,
            imagegen,
            node_ports: state.config.node_ports,
            run_nodes: !self.catalog_only,
            node_host: state.config.node_host,
            max_file_size: state.config.max_file_size,
            data_dir: state.data_path,
            log_level: self.log_level,
            log_dir: self.log_to_file.then_some(state.logs_path),
            ..Config::default()
        })
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let config = self.service_config(state)?;

        spawn_service(&config).await?;
        Ok("daemon ended".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daemon(catalog_only: bool, nodes_only: bool) -> Daemon {
        Daemon {
            catalog_only,
            nodes_only,
            log_level: tracing::Level::INFO,
            log_to_file: true,
        }
    }

    #[test]
    fn test_service_config_from_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::init(Some(dir.path().join("state")), None).unwrap();
        let data_path = state.data_path.clone();
        let logs_path = state.logs_path.clone();

        let config = daemon(false, true).service_config(state).unwrap();
        assert!(!config.run_catalog);
        assert!(config.run_nodes);
        assert_eq!(config.node_ports, vec![8001, 8002]);
        assert_eq!(config.data_dir, data_path);
        assert_eq!(config.log_dir, Some(logs_path));
    }

    #[test]
    fn test_bad_endpoint_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::init(Some(dir.path().join("state")), None).unwrap();
        state.config.imagegen_endpoint = "not a url".to_string();

        assert!(matches!(
            daemon(true, false).service_config(state),
            Err(DaemonError::InvalidEndpoint(_))
        ));
    }
}
