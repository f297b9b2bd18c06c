//! solonews CLI — topic news collector.
//!
//! Fetches search result pages, extracts relevant articles, and stores new
//! ones in a local libSQL database. Run summaries are printed as JSON.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
