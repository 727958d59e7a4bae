use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Lathe - incremental static-asset build pipeline
#[derive(Parser, Debug)]
#[command(name = "lathe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output NDJSON events
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./lathe.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output directory, overriding config and LATHE_OUTPUT
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build once; exits non-zero if anything failed
    Build {
        /// Rebuild everything regardless of the cache
        #[arg(short, long)]
        force: bool,

        /// Run every stage but write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Build, then rebuild on every change
    Watch {
        /// Run every stage but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Command restarted after every batch (overrides config)
        #[arg(long)]
        exec: Option<String>,
    },

    /// List suffix bindings, namespaces and hooks
    Stages,
}
