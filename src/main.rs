use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use picbed::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("picbed=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}
