//! Shell completion generation
//!
//! ```bash
//! source <(bomsim completions bash)
//! bomsim completions fish > ~/.config/fish/completions/bomsim.fish
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;
use std::io;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "bomsim", &mut io::stdout());
    Ok(())
}
