//! Lathe CLI - incremental static-asset build pipeline
//!
//! Usage: lathe <COMMAND>
//!
//! Commands:
//!   build   Build once
//!   watch   Build, then rebuild on every change
//!   stages  List suffix bindings

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod ui;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let json = cli.json;
    if let Err(err) = run(cli) {
        ui::output::print_error(&err, json);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let project = commands::load_project(cli.config.as_deref(), cli.output.as_deref(), cli.json)?;

    match cli.command {
        Commands::Build { force, dry_run } => commands::build::cmd_build(project, force, dry_run, cli.json),
        Commands::Watch { dry_run, exec } => commands::watch::cmd_watch(project, dry_run, exec, cli.json),
        Commands::Stages => commands::stages::cmd_stages(&project, cli.json),
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the level for this crate
fn setup_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lathe={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
