mod args;
mod op;
mod ops;
mod state;

use anyhow::Context;
use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Daemon, Generate, Get, Health, Init, List, Nodes, Register, Retrieve, Upload, Version};

command_enum! {
    (Daemon, Daemon),
    (Generate, Generate),
    (Get, Get),
    (Health, Health),
    (Init, Init),
    (List, List),
    (Nodes, Nodes),
    (Register, Register),
    (Retrieve, Retrieve),
    (Upload, Upload),
    (Version, Version),
}

async fn run(args: Args) -> anyhow::Result<OpOutput> {
    // explicit flag > config.toml ports > built-in defaults
    let remotes = op::resolve_remotes(args.catalog, args.node, args.config_path.clone())
        .context("invalid service address")?;

    let ctx = op::OpContext::new(remotes, args.config_path)
        .context("failed to create API clients")?;

    Ok(args.command.execute(&ctx).await?)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match run(args).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
