//! Gridforge CLI entry point.

use clap::Parser;

use gridforge::cli::{self, Cli, Commands};
use gridforge::infrastructure::config::ConfigLoader;
use gridforge::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => cli::handle_error(err, cli.json),
    };

    // Keep the guard alive so file logging flushes on exit.
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => cli::commands::run::execute(args, &config, cli.json).await,
        Commands::Status => cli::commands::status::execute(&config, cli.json).await,
        Commands::Send(args) => cli::commands::send::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        cli::handle_error(err, cli.json);
    }
}
