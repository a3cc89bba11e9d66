use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use service::config::{DEFAULT_CATALOG_PORT, DEFAULT_MAX_FILE_SIZE, DEFAULT_NODE_PORTS};
use service::imagegen::DEFAULT_ENDPOINT;

pub const APP_NAME: &str = "minidrop";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DATA_DIR_NAME: &str = "data";
pub const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listen port for the catalog service
    #[serde(default = "default_catalog_port")]
    pub catalog_port: u16,
    /// Listen ports for the storage nodes, one node per port
    #[serde(default = "default_node_ports")]
    pub node_ports: Vec<u16>,
    /// Host name the catalog uses in node addresses
    #[serde(default = "default_node_host")]
    pub node_host: String,
    /// Largest accepted upload, in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Upstream for the image generation proxy. The API key is only
    ///  ever read from the environment.
    #[serde(default = "default_imagegen_endpoint")]
    pub imagegen_endpoint: String,
}

fn default_catalog_port() -> u16 {
    DEFAULT_CATALOG_PORT
}

fn default_node_ports() -> Vec<u16> {
    DEFAULT_NODE_PORTS.to_vec()
}

fn default_node_host() -> String {
    "localhost".to_string()
}

fn default_max_file_size() -> usize {
    DEFAULT_MAX_FILE_SIZE
}

fn default_imagegen_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_port: default_catalog_port(),
            node_ports: default_node_ports(),
            node_host: default_node_host(),
            max_file_size: default_max_file_size(),
            imagegen_endpoint: default_imagegen_endpoint(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the minidrop directory (~/.minidrop)
    pub minidrop_dir: PathBuf,
    /// Root of the node stores; node `p` lives in `data/node_<p>`
    pub data_path: PathBuf,
    /// Directory for daemon log files
    pub logs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the minidrop directory path (custom or default ~/.minidrop)
    pub fn minidrop_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new minidrop state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let minidrop_dir = Self::minidrop_dir(custom_path)?;

        if minidrop_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&minidrop_dir)?;

        let data_path = minidrop_dir.join(DATA_DIR_NAME);
        fs::create_dir_all(&data_path)?;

        let logs_path = minidrop_dir.join(LOGS_DIR_NAME);
        fs::create_dir_all(&logs_path)?;

        let config = config.unwrap_or_default();
        let config_path = minidrop_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            minidrop_dir,
            data_path,
            logs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the minidrop directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let minidrop_dir = Self::minidrop_dir(custom_path)?;

        if !minidrop_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let data_path = minidrop_dir.join(DATA_DIR_NAME);
        let logs_path = minidrop_dir.join(LOGS_DIR_NAME);
        let config_path = minidrop_dir.join(CONFIG_FILE_NAME);

        if !data_path.exists() {
            return Err(StateError::MissingFile("data/".to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile("config.toml".to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            minidrop_dir,
            data_path,
            logs_path,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("minidrop directory not initialized. Run 'minidrop init' first")]
    NotInitialized,

    #[error("minidrop directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");

        let config = AppConfig {
            node_ports: vec![8101],
            ..AppConfig::default()
        };
        let state = AppState::init(Some(path.clone()), Some(config.clone())).unwrap();
        assert!(state.data_path.is_dir());
        assert!(state.config_path.is_file());

        let loaded = AppState::load(Some(path)).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.data_path, state.data_path);
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");

        AppState::init(Some(path.clone()), None).unwrap();
        assert!(matches!(
            AppState::init(Some(path), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        AppState::init(Some(path.clone()), None).unwrap();
        fs::write(path.join(CONFIG_FILE_NAME), "catalog_port = 9500\n").unwrap();

        let loaded = AppState::load(Some(path)).unwrap();
        assert_eq!(loaded.config.catalog_port, 9500);
        assert_eq!(loaded.config.node_ports, vec![8001, 8002]);
        assert_eq!(loaded.config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(loaded.config.imagegen_endpoint, DEFAULT_ENDPOINT);
    }
}
