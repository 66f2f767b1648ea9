//! Artmap CLI - Command-line interface
//!
//! Composition root: resolves configuration, installs logging, opens the
//! configured artifact store and runs one command against it.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod geojson_output;
mod interactive;
mod output;
mod output_types;
mod progress;
mod storage;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use errors::CliError;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Create async runtime
    let runtime = tokio::runtime::Runtime::new()?;

    // Execute the command
    if let Err(err) = runtime.block_on(commands::execute(cli)) {
        if let Some(cli_error) = err.downcast_ref::<CliError>() {
            cli_error.display();
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}
