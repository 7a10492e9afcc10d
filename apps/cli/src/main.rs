//! siteforge CLI — build-hook runner for Markdown-based sites.
//!
//! Walks a content tree, derives node slugs and content types, and emits
//! a page manifest from content nodes, a product feed, and a spreadsheet
//! export.

mod commands;
mod ingest;

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
