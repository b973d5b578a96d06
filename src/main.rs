use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hybridfix::cli::{self, Cli, Commands};

fn init_logging() {
    let filter = EnvFilter::try_from_env("HYBRIDFIX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new("hybridfix=info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Fix(args) => {
            cli::commands::fix::execute(args).await?;
        }
        Commands::Index(args) => {
            cli::commands::index::execute(args).await?;
        }
    }

    Ok(())
}
