use anyhow::Result;
use clap::Parser;

use restock::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    restock::run(Cli::parse()).await
}
