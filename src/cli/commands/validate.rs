//! `bomsim validate` command - structural checks on a snapshot

use console::style;
use miette::{Diagnostic, IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{load_graph, render_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::validate_graph;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Snapshot file or directory
    pub snapshot: PathBuf,

    /// Show summary only, don't show individual findings
    #[arg(long)]
    pub summary: bool,
}

#[derive(Serialize)]
struct Finding {
    code: String,
    message: String,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let graph = load_graph(&args.snapshot)?;
    let findings: Vec<Finding> = validate_graph(&graph)
        .into_iter()
        .map(|e| Finding {
            code: e.code().map(|c| c.to_string()).unwrap_or_default(),
            message: e.to_string(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&findings).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&findings).into_diagnostic()?);
        }
        OutputFormat::Tsv | OutputFormat::Csv | OutputFormat::Md => {
            let rows: Vec<Vec<String>> = findings
                .iter()
                .map(|f| vec![f.code.clone(), f.message.clone()])
                .collect();
            print!("{}", render_table(&["code", "message"], &rows, format)?);
        }
        OutputFormat::Auto => {
            if !args.summary {
                for f in &findings {
                    println!("{} {} {}", style("✗").red(), style(&f.code).dim(), f.message);
                }
            }

            if !global.quiet {
                println!();
                println!("{}", style("─".repeat(60)).dim());
                println!("{}", style("Validation Summary").bold());
                println!("{}", style("─".repeat(60)).dim());
                println!("  Items:          {}", style(graph.items().len()).cyan());
                println!("  BOMs:           {}", style(graph.boms().len()).cyan());
                println!("  Work centers:   {}", style(graph.work_centers().len()).cyan());
                println!("  Problems:       {}", style(findings.len()).red());
                println!();
            }
        }
    }

    match findings.len() {
        0 => {
            if format == OutputFormat::Auto {
                println!("{} Snapshot passed validation!", style("✓").green().bold());
            }
            Ok(())
        }
        1 => Err(miette::miette!("Validation failed: 1 problem found")),
        n => Err(miette::miette!("Validation failed: {} problems found", n)),
    }
}
