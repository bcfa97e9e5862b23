//! `bomsim sim` command - Monte Carlo simulation of the quoting process

use chrono::{DateTime, Utc};
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::commands::tree::pick_root;
use crate::cli::helpers::{format_seconds, load_graph, render_table, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::entities::Complexity;
use crate::sim::{
    summarize_items, summarize_overall, ItemRun, ItemSummary, OverallSummary, Simulator, TrialResult,
};

#[derive(clap::Args, Debug)]
pub struct SimArgs {
    /// Snapshot file or directory
    pub snapshot: PathBuf,

    /// Assembly to quote
    pub item: Option<String>,

    /// Quote every top-level assembly
    #[arg(long, conflicts_with = "item")]
    pub all: bool,

    /// Restrict to top-level assemblies of this complexity
    #[arg(long, short = 'c')]
    pub complexity: Option<Complexity>,

    /// Use the software-assisted process instead of the manual one
    #[arg(long)]
    pub software: bool,

    /// Trials per item
    #[arg(long, short = 'n')]
    pub trials: Option<usize>,

    /// Base random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Example trials to show per item
    #[arg(long, default_value_t = 0)]
    pub samples: usize,

    /// Export every trial (.csv or .json)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct SimReport<'a> {
    generated_at: DateTime<Utc>,
    model: &'a str,
    seed: u64,
    trials_per_item: usize,
    items: Vec<ItemSummary>,
    /// Absent when none of the items had anything to quote
    #[serde(skip_serializing_if = "Option::is_none")]
    overall: Option<OverallSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    samples: Vec<&'a TrialResult>,
}

#[derive(Serialize)]
struct TrialRow<'a> {
    item_no: &'a str,
    trial: usize,
    total_time_sec: f64,
    manual_entries: u32,
    error_count: usize,
    undetected_errors: usize,
}

pub fn run(args: SimArgs, global: &GlobalOpts, format: OutputFormat, config: &Config) -> Result<()> {
    let graph = load_graph(&args.snapshot)?;
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    let trials = args.trials.unwrap_or_else(|| config.trials());

    let items: Vec<String> = if args.all {
        graph
            .top_level_assemblies(args.complexity)
            .into_iter()
            .map(|item| item.item_no.clone())
            .collect()
    } else if let Some(item) = &args.item {
        vec![item.clone()]
    } else if args.complexity.is_some() {
        vec![pick_root(&graph, args.complexity, Some(seed))?]
    } else {
        miette::bail!("Give an ITEM, --all or --complexity");
    };

    let model = if args.software {
        config.software_model()
    } else {
        config.manual_model()
    };
    let simulator = Simulator::new(model)?.with_limits(config.tree_limits());
    let runs = simulator.simulate_items(&graph, &items, trials, seed)?;

    if let Some(path) = &args.output {
        export_trials(path, &runs)?;
    }

    let report = SimReport {
        generated_at: Utc::now(),
        model: &simulator.model().name,
        seed,
        trials_per_item: trials,
        items: summarize_items(&runs),
        overall: if runs.iter().any(|r| !r.trials.is_empty()) {
            Some(summarize_overall(&runs)?)
        } else {
            None
        },
        samples: runs
            .iter()
            .flat_map(|run| run.trials.iter().take(args.samples))
            .collect(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&report).into_diagnostic()?);
        }
        _ => print_report(&report, global, format)?,
    }

    if let Some(path) = &args.output {
        if !global.quiet {
            eprintln!(
                "{} Exported {} trials to {}",
                style("✓").green(),
                runs.iter().map(|r| r.trials.len()).sum::<usize>(),
                style(path.display()).cyan()
            );
        }
    }
    Ok(())
}

fn print_report(report: &SimReport, global: &GlobalOpts, format: OutputFormat) -> Result<()> {
    let human = format == OutputFormat::Auto;
    let rows: Vec<Vec<String>> = report
        .items
        .iter()
        .map(|i| {
            let s = &i.summary;
            vec![
                i.item_no.clone(),
                if human {
                    truncate_str(&i.description, 28)
                } else {
                    i.description.clone()
                },
                s.trials.to_string(),
                format!("{:.1}", s.avg_time_sec),
                format!("{:.1}", s.std_dev_time_sec),
                format!("{:.1}", s.p95_time_sec),
                format!("{:.1}", s.avg_entries),
                format!("{:.2}", s.avg_errors),
            ]
        })
        .collect();
    print!(
        "{}",
        render_table(
            &["item_no", "description", "trials", "avg_sec", "std_sec", "p95_sec", "entries", "errors"],
            &rows,
            format
        )?
    );

    if !human {
        return Ok(());
    }

    let Some(o) = &report.overall else {
        println!(
            "{} Nothing to quote: no selected item is an assembly with a costable BOM",
            style("!").yellow()
        );
        return Ok(());
    };

    if !report.samples.is_empty() {
        println!();
        println!("{}", style("Sample trials").bold());
        for t in &report.samples {
            println!(
                "  {} {} entries, {} errors, {}",
                style(&t.item_no).cyan(),
                t.manual_entries,
                t.error_count,
                format_seconds(t.total_time_sec)
            );
            for e in &t.errors {
                let mark = if e.detected {
                    style("caught").green()
                } else {
                    style("missed").red()
                };
                println!("      {} [{}] {}", mark, e.phase, e.description);
            }
        }
    }

    if !global.quiet {
        println!();
        println!("{}", style("─".repeat(60)).dim());
        println!(
            "{} ({} model, seed {})",
            style("Simulation Summary").bold(),
            report.model,
            report.seed
        );
        println!("{}", style("─".repeat(60)).dim());
        println!("  Items simulated:   {}", style(o.items).cyan());
        println!("  Trials:            {}", style(o.pooled.trials).cyan());
        println!(
            "  Avg quote time:    {} (per-item mean {})",
            style(format_seconds(o.pooled.avg_time_sec)).yellow(),
            format_seconds(o.mean_item_avg_time_sec)
        );
        println!("  Avg manual entries: {:.1}", o.pooled.avg_entries);
        println!("  Avg errors:        {:.2}", o.pooled.avg_errors);
    }
    Ok(())
}

/// Every trial of every item as CSV rows or JSON
fn export_trials(path: &Path, runs: &[ItemRun]) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let mut writer = csv::Writer::from_path(path).into_diagnostic()?;
        for run in runs {
            for (idx, t) in run.trials.iter().enumerate() {
                writer
                    .serialize(TrialRow {
                        item_no: &run.item_no,
                        trial: idx + 1,
                        total_time_sec: t.total_time_sec,
                        manual_entries: t.manual_entries,
                        error_count: t.error_count,
                        undetected_errors: t.errors.iter().filter(|e| !e.detected).count(),
                    })
                    .into_diagnostic()?;
            }
        }
        writer.flush().into_diagnostic()?;
    } else {
        let json = serde_json::to_string_pretty(runs).into_diagnostic()?;
        std::fs::write(path, json).into_diagnostic()?;
    }
    Ok(())
}
