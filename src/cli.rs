//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use multirepo_docs::output::OutputConfig;

/// Multirepo - Aggregate documentation from many git repositories
#[derive(Parser, Debug)]
#[command(name = "multirepo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch every imported repository and write the resolved site config
    Import(commands::import::ImportArgs),

    /// Show the imports of a site config without fetching anything
    Plan(commands::plan::PlanArgs),

    /// Remove the directory holding imported docs
    Clean(commands::clean::CleanArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // RUST_LOG still wins over --log-level.
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .format_timestamp(None)
        .try_init();

        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Import(args) => commands::import::execute(args, output),
            Commands::Plan(args) => commands::plan::execute(args, output),
            Commands::Clean(args) => commands::clean::execute(args, output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
