//! Command implementations

mod config;
mod layers;
mod query;
mod seed;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::storage::Storage;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(cli.config.as_deref(), cli.overrides())?;

    // Inspecting configuration must work even when no backend can be opened
    if let Commands::Config = cli.command {
        return config::execute(&config, &output);
    }

    let storage = Storage::open(&config).await?;
    tracing::debug!(backend = ?storage.backend, "Opened artifact store");

    match cli.command {
        Commands::Seed(args) => seed::execute(args, &storage, &output).await,
        Commands::Bounds(args) => query::bounds(args, &storage, &output).await,
        Commands::Circle(args) => query::circle(args, &storage, &output).await,
        Commands::Aggregate(args) => query::aggregate(args, &storage, &output).await,
        Commands::Viewport(args) => {
            query::viewport(args, config.default_limit.value, &storage, &output).await
        }
        Commands::Count(args) => query::count(args, &storage, &output).await,
        Commands::Layers(args) => layers::execute(args.command, &storage, &output).await,
        Commands::Config => config::execute(&config, &output),
    }
}
