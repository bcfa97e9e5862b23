//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, rollup::RollupArgs, sim::SimArgs,
    tree::TreeArgs, validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "bomsim")]
#[command(author, version, about = "BOM cost roll-up and quoting process simulator")]
#[command(long_about = "Rolls manufactured cost up through nested bills of materials and \
simulates the time, entries and errors of quoting the same structure by hand.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log debug detail
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file to use instead of ./bomsim.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Price routings and roll costs up through every BOM
    Rollup(RollupArgs),

    /// Check a snapshot for structural problems
    Validate(ValidateArgs),

    /// Show the cost or routing tree of an item
    Tree(TreeArgs),

    /// Simulate quoting one or more assemblies
    Sim(SimArgs),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically pick a human-readable layout
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}

impl OutputFormat {
    /// Explicit flag wins; otherwise fall back to the configured default
    pub fn resolve(self, configured: Option<&str>) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|s| OutputFormat::from_str(s, true).ok())
            .unwrap_or(OutputFormat::Auto)
    }
}
