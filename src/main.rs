//! Vigil CLI entry point.

use clap::Parser;

use vigil::cli::{Cli, Commands};
use vigil::infrastructure::config::ConfigLoader;
use vigil::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            std::process::exit(2);
        }
    };

    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Logging setup error: {err:#}");
        std::process::exit(2);
    }

    let result = match cli.command {
        Commands::Provision => vigil::cli::commands::provision::execute(config).await,
        Commands::Run => vigil::cli::commands::run::execute(config).await,
        Commands::ScrapeLoop => vigil::cli::commands::scrape_loop::execute(config).await,
        Commands::DatasourceLoop => vigil::cli::commands::datasource_loop::execute(config).await,
    };

    if let Err(err) = result {
        vigil::cli::handle_error(&err);
    }
}
