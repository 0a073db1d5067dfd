//! ResearchDesk CLI: evidence-grounded research reports.
//!
//! Harvests quotes from already-fetched sources, synthesizes a report with
//! an LLM (or heuristically), and exports it as a ZIP bundle.

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
