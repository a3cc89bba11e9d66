use std::error::Error;
use std::path::PathBuf;

use url::Url;

use service::client::{ApiClient, ApiError};
use service::config::{DEFAULT_CATALOG_PORT, DEFAULT_NODE_PORTS};

use crate::state::AppState;

/// Where the CLI sends catalog and node requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remotes {
    pub catalog: Url,
    pub node: Url,
}

/// Resolve the catalog and node URLs for the API clients.
///
/// Priority: explicit flag > config file ports > built-in defaults.
pub fn resolve_remotes(
    catalog: Option<Url>,
    node: Option<Url>,
    config_path: Option<PathBuf>,
) -> Result<Remotes, url::ParseError> {
    let state = AppState::load(config_path).ok();

    let catalog = match catalog {
        Some(url) => url,
        None => {
            let port = state
                .as_ref()
                .map(|s| s.config.catalog_port)
                .unwrap_or(DEFAULT_CATALOG_PORT);
            Url::parse(&format!("http://localhost:{}", port))?
        }
    };

    let node = match node {
        Some(url) => url,
        None => {
            let (host, port) = match &state {
                Some(s) => (
                    s.config.node_host.clone(),
                    s.config
                        .node_ports
                        .first()
                        .copied()
                        .unwrap_or(DEFAULT_NODE_PORTS[0]),
                ),
                None => ("localhost".to_string(), DEFAULT_NODE_PORTS[0]),
            };
            Url::parse(&format!("http://{}:{}", host, port))?
        }
    };

    Ok(Remotes { catalog, node })
}

#[derive(Clone)]
pub struct OpContext {
    /// Client for the catalog service
    pub catalog: ApiClient,
    /// Client for the storage node uploads and retrievals go to
    pub node: ApiClient,
    /// Optional custom config path (defaults to ~/.minidrop)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(remotes: Remotes, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        Ok(Self {
            catalog: ApiClient::new(&remotes.catalog)?,
            node: ApiClient::new(&remotes.node)?,
            config_path,
        })
    }

    /// The node URL as the catalog records it in `replicas`.
    pub fn node_address(&self) -> String {
        self.node.base_url().as_str().trim_end_matches('/').to_string()
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::state::AppConfig;

    #[test]
    fn test_resolve_remotes_explicit_wins() {
        let catalog = Url::parse("http://catalog.example.com:9999").unwrap();
        let node = Url::parse("http://node.example.com:8888").unwrap();
        let remotes =
            resolve_remotes(Some(catalog.clone()), Some(node.clone()), None).unwrap();
        assert_eq!(remotes, Remotes { catalog, node });
    }

    #[test]
    fn test_resolve_remotes_falls_back_to_defaults() {
        let remotes =
            resolve_remotes(None, None, Some(PathBuf::from("/nonexistent"))).unwrap();
        assert_eq!(remotes.catalog.as_str(), "http://localhost:9000/");
        assert_eq!(remotes.node.as_str(), "http://localhost:8001/");
    }

    #[test]
    fn test_resolve_remotes_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minidrop");
        let config = AppConfig {
            catalog_port: 9100,
            node_ports: vec![8101, 8102],
            node_host: "storage.local".to_string(),
            ..AppConfig::default()
        };
        AppState::init(Some(path.clone()), Some(config)).unwrap();

        let remotes = resolve_remotes(None, None, Some(path)).unwrap();
        assert_eq!(remotes.catalog.port(), Some(9100));
        assert_eq!(remotes.node.as_str(), "http://storage.local:8101/");
    }

    #[test]
    fn test_node_address_has_no_trailing_slash() {
        let remotes = Remotes {
            catalog: Url::parse("http://localhost:9000").unwrap(),
            node: Url::parse("http://localhost:8002").unwrap(),
        };
        let ctx = OpContext::new(remotes, None).unwrap();
        assert_eq!(ctx.node_address(), "http://localhost:8002");
    }
}
