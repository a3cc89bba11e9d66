//! HTTP services for minidrop.
//!
//! Two independent services live here, sharing no state:
//! - the storage node service (upload / retrieve / health over a [`common::store::ContentStore`])
//! - the catalog service (register / get / list over a [`common::catalog::Catalog`]
//!   and [`common::registry::NodeRegistry`], plus the image generation proxy)
//!
//! Plus the pieces both need: HTTP plumbing, a typed API client, and the
//! process lifecycle (logging, graceful shutdown).

pub mod catalog;
pub mod client;
pub mod config;
pub mod http;
pub mod imagegen;
pub mod node;
pub mod process;

// Re-export key types for convenience
pub use catalog::CatalogState;
pub use config::Config;
pub use node::NodeState;
pub use process::{spawn_service, start_service, ShutdownHandle};
