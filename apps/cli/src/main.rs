//! oddsboard CLI: scrape the Jingcai football listing, enrich fixtures with
//! Asian handicap and Kelly data, and write the analysis workbook.

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
