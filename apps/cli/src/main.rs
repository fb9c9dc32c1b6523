//! sitegen CLI: provision a new site from the starter template.
//!
//! Clones the template content, fills in its placeholders, registers the
//! site configuration, then previews and publishes every page.

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
