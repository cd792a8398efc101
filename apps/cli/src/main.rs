//! GuideVault CLI — guide answer enrichment and question extraction.
//!
//! Ingests completed guide submissions, enriches them with session lineage
//! and agent/campaign metadata, and maintains the question lookup table.

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
