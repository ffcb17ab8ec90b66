//! CLI command definitions and handlers

mod clean;
mod dump;
mod gc;
mod query;
mod stats;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lookup_index::{
    IdentityPathConverter, IndexConfig, LookupStorage, PathConverter, RelativePathConverter,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// lookup-index - inspect and maintain an incremental-compilation lookup index
#[derive(Parser, Debug)]
#[command(name = "lookup-index")]
#[command(
    version,
    about = "Inspect and maintain the persistent symbol-lookup index of an incremental build",
    after_help = "\
Examples:
  lookup-index build/lookups stats             Index size summary
  lookup-index build/lookups query pkg foo     Files that looked up pkg#foo
  lookup-index build/lookups dump              Deterministic text dump
  lookup-index build/lookups gc                Drop stale ids and renumber"
)]
pub struct Cli {
    /// Directory holding the index files
    pub data_dir: PathBuf,

    /// Store paths relative to this project root
    #[arg(long, global = true, env = "LOOKUP_INDEX_ROOT")]
    pub root: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show index size and id usage
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the live files that looked up NAME in SCOPE
    Query {
        scope: String,
        name: String,
    },

    /// Print the lookup, file-to-id and id-to-file maps
    Dump {
        /// Only dump these symbols (`scope#name`, repeatable)
        #[arg(long = "symbol", value_name = "SCOPE#NAME")]
        symbols: Vec<String>,
    },

    /// Drop stale file ids and renumber the survivors densely
    Gc,

    /// Verify the file <-> id maps are mutual inverses
    Check,

    /// Delete all index data
    Clean {
        /// Show what would be removed without removing it
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Stats { json } => stats::run(&open(&cli.data_dir, cli.root.as_deref())?, json),
        Commands::Query { ref scope, ref name } => {
            query::run(&open(&cli.data_dir, cli.root.as_deref())?, scope, name)
        }
        Commands::Dump { ref symbols } => {
            dump::run(&open(&cli.data_dir, cli.root.as_deref())?, symbols)
        }
        Commands::Gc => gc::run(&open(&cli.data_dir, cli.root.as_deref())?),
        Commands::Check => gc::check(&open(&cli.data_dir, cli.root.as_deref())?),
        Commands::Clean { dry_run } => clean::run(&cli.data_dir, cli.root.as_deref(), dry_run),
    }
}

/// Open the index in `data_dir` with config from the usual sources.
fn open(data_dir: &Path, root: Option<&Path>) -> Result<LookupStorage> {
    if !data_dir.is_dir() {
        anyhow::bail!("No lookup index at {}", data_dir.display());
    }
    let converter: Arc<dyn PathConverter> = match root {
        Some(root) => Arc::new(RelativePathConverter::new(root)),
        None => Arc::new(IdentityPathConverter),
    };
    let config = IndexConfig::load(data_dir);
    LookupStorage::with_config(data_dir, converter, config)
        .with_context(|| format!("Failed to open lookup index at {}", data_dir.display()))
}
