//! Command-line interface.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Adaptive experiment scheduler for batch clusters.
#[derive(Parser, Debug)]
#[command(name = "gridforge", version, about)]
pub struct Cli {
    /// Output machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Load configuration from a specific file instead of .gridforge/
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduling engine over a sweep file
    Run(commands::run::RunArgs),
    /// Show live cluster jobs for the configured tracker
    Status,
    /// Publish a raw message on the engine's channel
    Send(commands::send::SendArgs),
}

/// Report a fatal error in the selected output mode and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{payload}");
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
