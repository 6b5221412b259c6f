//! Hub Control - CLI for KPI cycles, achievements and rewards

use anyhow::Result;
use clap::Parser;
use hubctl::cli::Cli;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("hubctl v{}", env!("HUB_VERSION"));

    hubctl::commands::run(cli).await
}
