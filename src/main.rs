use anyhow::Context;
use clap::Parser;
use hpfs_lib::bootstrap::{init_tracing_subscriber, resolve_config, AppDeps};
use hpfs_lib::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;
    init_tracing_subscriber(&config.log_dir()).context("Failed to initialize tracing")?;
    tracing::debug!(data_dir = %config.data_dir.display(), api = %config.api_base_url, "configuration resolved");

    let deps = AppDeps::wire(config)?;
    cli::run(cli.command, &deps).await
}
