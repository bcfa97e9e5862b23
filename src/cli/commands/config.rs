//! `bomsim config` command - show configuration

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::PROJECT_CONFIG;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Include built-in defaults for unset values
    #[arg(long)]
    pub resolved: bool,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts, format: OutputFormat, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, format, config),
        ConfigCommands::Path => run_path(global),
    }
}

fn run_show(args: ShowArgs, format: OutputFormat, config: &Config) -> Result<()> {
    let shown = if args.resolved {
        config.resolved()
    } else {
        config.clone()
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown).into_diagnostic()?),
        _ => print!("{}", serde_yml::to_string(&shown).into_diagnostic()?),
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let project = global
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG));

    let show = |label: &str, path: Option<PathBuf>| match path {
        Some(path) => {
            let state = if path.exists() {
                style("exists").green()
            } else {
                style("not found").dim()
            };
            println!("{:<8} {} ({})", label, path.display(), state);
        }
        None => println!("{:<8} {}", label, style("unavailable").dim()),
    };

    show("global", Config::global_config_path());
    show("project", Some(project));
    Ok(())
}
