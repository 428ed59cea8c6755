//! releasebot: republishes Ryzom release notes to a subreddit.
//!
//! Each run fetches the release notes page, posts every entry not yet
//! recorded in the ledger (oldest first) and records its key.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::run(cli).await
}
