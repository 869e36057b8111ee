//! vectable CLI entry point.
//!
//! Binary name: `vectable`
//!
//! Parses CLI arguments, loads the store config, then dispatches to the
//! matching command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use vectable_observe::TracingOptions;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,vectable_core=debug,vectable_infra=debug",
        _ => "trace",
    };
    vectable_observe::init_tracing(
        &TracingOptions::new(filter)
            .json(cli.log_json)
            .otel(cli.otel),
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need a store
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "vectable", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.config.as_deref()).await?;

    let result = match &cli.command {
        Commands::Schema => cli::schema::show_schema(&state, cli.json).await,
        Commands::Plan => cli::schema::show_plan(&state, cli.json).await,
        Commands::Migrate => cli::schema::migrate(&state, cli.json).await,
        Commands::Insert {
            metadata,
            embedding,
        } => cli::record::insert(&state, metadata, embedding, cli.json).await,
        Commands::Query { filter } => cli::record::query(&state, filter, cli.json).await,
        Commands::Search {
            embedding,
            filter,
            options,
        } => cli::record::search(&state, embedding, filter, options, cli.json).await,
        Commands::Stats { filter } => cli::record::stats(&state, filter, cli.json).await,
        Commands::Completions { .. } => Ok(()),
    };

    vectable_observe::shutdown_tracing();
    result
}
