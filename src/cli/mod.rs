//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::mode::BuildMode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// assetflow - Assemble front-end asset pipeline configurations
#[derive(Parser)]
#[command(name = "assetflow")]
#[command(about = "assetflow - Assemble front-end asset pipeline configurations for the bundler engine")]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every pipeline command.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Build mode; defaults to NODE_ENV ("production" selects production)
    #[arg(long)]
    pub mode: Option<BuildMode>,

    /// Path to assetflow.toml (searched upwards from the working directory if omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Source directory to discover (overrides assetflow.toml)
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Strict mode: ambiguous rule matches and advisory collaborator failures are errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the assembled pipeline configuration as JSON
    Config {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output directory (overrides assetflow.toml)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Resolve every discovered source to its rule and chain
    Plan {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run post-build collaborators (translation extraction, remote sync)
    Finish {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

/// Route library logs to stderr, keeping stdout for command output.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Config { pipeline, out, compact } => {
            build::run_config(&pipeline, out.as_deref(), compact)
        }
        Commands::Plan { pipeline, json } => build::run_plan(&pipeline, json),
        Commands::Finish { pipeline } => build::run_finish(&pipeline),
    }
}
