//! `bomsim rollup` command - price routings and roll up costs

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{format_cost, load_graph, render_table, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{apply_process_costs, check_depths, roll_up_costs, save_snapshot, validate_depths};

#[derive(clap::Args, Debug)]
pub struct RollupArgs {
    /// Snapshot file or directory
    pub snapshot: PathBuf,

    /// Write the costed snapshot here (format from extension)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Fail when stored BOM depths disagree with the structure
    #[arg(long)]
    pub strict_depth: bool,

    /// Only list assemblies
    #[arg(long)]
    pub assemblies_only: bool,
}

#[derive(Serialize)]
struct CostRow<'a> {
    item_no: &'a str,
    description: &'a str,
    kind: &'a str,
    base_cost: f64,
    process_cost: f64,
    total_cost: Option<f64>,
}

pub fn run(args: RollupArgs, global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let mut graph = load_graph(&args.snapshot)?;

    if args.strict_depth {
        check_depths(&graph)?;
    } else if !global.quiet {
        for violation in validate_depths(&graph) {
            eprintln!("{} {}", style("!").yellow(), violation);
        }
    }

    let routing = apply_process_costs(&mut graph)?;
    let report = roll_up_costs(&mut graph)?;

    if let Some(path) = args.output {
        save_snapshot(&path, &graph.to_snapshot())?;
        if !global.quiet {
            println!(
                "{} Costed {} items ({} assemblies, {} routing steps) -> {}",
                style("✓").green(),
                style(graph.items().len()).cyan(),
                report.assemblies,
                routing.steps_priced,
                style(path.display()).cyan()
            );
        }
        return Ok(());
    }

    let rows: Vec<CostRow> = graph
        .items()
        .iter()
        .filter(|item| !args.assemblies_only || item.is_assembly())
        .map(|item| CostRow {
            item_no: &item.item_no,
            description: &item.description,
            kind: item.kind.code(),
            base_cost: item.base_cost,
            process_cost: item.process_cost(),
            total_cost: item.total_cost(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&rows).into_diagnostic()?);
        }
        _ => {
            let human = format == OutputFormat::Auto;
            let table: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    vec![
                        r.item_no.to_string(),
                        if human {
                            truncate_str(r.description, 30)
                        } else {
                            r.description.to_string()
                        },
                        r.kind.to_string(),
                        format!("{:.2}", r.base_cost),
                        format!("{:.2}", r.process_cost),
                        format_cost(r.total_cost),
                    ]
                })
                .collect();
            print!(
                "{}",
                render_table(
                    &["item_no", "description", "kind", "base", "process", "total"],
                    &table,
                    format
                )?
            );

            if human && !global.quiet {
                println!(
                    "{} {} items, {} assemblies over {} levels",
                    style("Summary").bold(),
                    rows.len(),
                    report.assemblies,
                    report.levels
                );
            }
        }
    }

    Ok(())
}
