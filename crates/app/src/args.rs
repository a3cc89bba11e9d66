pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "minidrop")]
#[command(about = "Content-addressed storage nodes with a central catalog")]
pub struct Args {
    /// Catalog URL (defaults to the catalog port in config.toml, then 9000)
    #[arg(long, global = true)]
    pub catalog: Option<Url>,

    /// Storage node URL (defaults to the first node port in config.toml, then 8001)
    #[arg(long, global = true)]
    pub node: Option<Url>,

    /// Path to the minidrop config directory (defaults to ~/.minidrop)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
