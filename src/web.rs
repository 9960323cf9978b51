#![cfg(not(tarpaulin_include))]

use clap::Parser;
use csv_desk::app;
use csv_desk::config::{Cli, Config};
use csv_desk::logging::init_logging;

/// Main entry point for the web application
///
/// Loads `.env` (if present) before parsing flags so that every option can
/// come from the file, the environment or the command line.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    let config = Config::from_cli(&cli)?;
    app::run(config).await
}
