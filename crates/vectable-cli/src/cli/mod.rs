//! CLI command definitions for the `vectable` binary.
//!
//! Uses clap derive macros for argument parsing. Every command except
//! `completions` loads the store described by the config file.

pub mod input;
pub mod record;
pub mod schema;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use vectable_types::config::SimilarityMethod;

/// Manage and search a vectable store.
#[derive(Parser)]
#[command(name = "vectable", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store config (default: $VECTABLE_CONFIG, then ./vectable.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans to stdout through OpenTelemetry.
    ///
    /// Shares stdout with command output, so it cannot be combined with --json.
    #[arg(long, global = true, conflicts_with = "json")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the desired schema next to the live table.
    Schema,

    /// Print the statements `migrate` would run, without running them.
    Plan,

    /// Create or reconcile the live table.
    Migrate,

    /// Insert one record.
    Insert {
        /// Metadata as a JSON object, e.g. '{"id": "a", "user": "alice"}'.
        #[arg(short, long, default_value = "{}")]
        metadata: String,

        /// Embedding as a JSON array of numbers.
        #[arg(short, long)]
        embedding: String,
    },

    /// List records matching a filter.
    #[command(alias = "ls")]
    Query {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Rank records by similarity to an embedding.
    Search {
        /// Target embedding as a JSON array of numbers.
        #[arg(short, long)]
        embedding: String,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        options: SearchArgs,
    },

    /// Record count and store summary.
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Predicate `column:op:value`, op one of == != > >= < <=. Repeat to AND.
    #[arg(short = 'w', long = "where", value_name = "PREDICATE")]
    pub predicates: Vec<String>,
}

/// Overrides for the `[search]` section of the config.
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// cosine, euclidean, or dot_product.
    #[arg(long)]
    pub method: Option<SimilarityMethod>,

    /// Concurrent scoring workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Outlier cutoff in standard deviations; 0 disables it.
    #[arg(long)]
    pub std_deviations: Option<f64>,

    /// Maximum results; 0 means unbounded.
    #[arg(short, long)]
    pub limit: Option<usize>,
}
