//! `dcp`: command-line access to the DCP query normalizer and provider
//! configuration store.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = dcp_shared::load_config()?;
    commands::init_tracing(&cli, &config);
    commands::run(cli, config).await
}
