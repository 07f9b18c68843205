//! Lekcjonarz CLI: liturgical reading crawler and extractor.
//!
//! Walks the liturgia.wiara.pl reading navigator into a Job Store, then turns
//! every job into a structured JSON file of the day's readings.

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
