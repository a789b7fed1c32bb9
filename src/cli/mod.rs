//! Command-line interface.

pub mod commands;
pub mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

/// Keeps a platform-hosted observability stack converged with desired state.
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about)]
pub struct Cli {
    /// Configuration file (defaults to vigil.yaml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the backing datastore and deploy the observability stack
    Provision,

    /// Run all convergence loops until interrupted
    Run,

    /// Run only the scrape-config convergence loop (collector sidecar)
    ScrapeLoop,

    /// Run only the dashboard datasource loop
    DatasourceLoop,
}

/// Log the failure and exit non-zero.
pub fn handle_error(err: &anyhow::Error) -> ! {
    error!(error = %err, "command failed");
    eprintln!("Error: {err:#}");
    std::process::exit(1);
}
