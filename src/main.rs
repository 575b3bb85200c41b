// gpsmodel - Dynamic platform model tool for u-blox 8 / M8 receivers
// Main entry point

mod cli;
mod config;
mod logging;
mod receiver;
mod ubx;

use anyhow::Result;
use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    logging::init(cli.verbose);

    cli::run(cli).await
}
