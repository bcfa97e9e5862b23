//! `bomsim tree` command - indented cost or routing tree

use console::style;
use miette::{IntoDiagnostic, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::path::PathBuf;

use crate::cli::helpers::{format_cost, format_seconds, load_graph};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{
    apply_process_costs, build_cost_tree_with_limits, build_routing_tree_with_limits, roll_up_costs,
    BomGraph, Config, CostNode, RoutingNode, TreeLimits,
};
use crate::entities::Complexity;

#[derive(clap::Args, Debug)]
pub struct TreeArgs {
    /// Snapshot file or directory
    pub snapshot: PathBuf,

    /// Root item (default: a random top-level assembly)
    pub item: Option<String>,

    /// Pick the root among top-level assemblies of this complexity
    #[arg(long, short = 'c')]
    pub complexity: Option<Complexity>,

    /// Show work-center minutes instead of costs
    #[arg(long)]
    pub routing: bool,

    /// Children shown per node
    #[arg(long)]
    pub max_children: Option<usize>,

    /// Deepest level expanded
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Seed for picking a random root
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: TreeArgs, global: &GlobalOpts, format: OutputFormat, config: &Config) -> Result<()> {
    let mut graph = load_graph(&args.snapshot)?;
    let defaults = config.tree_limits();
    let limits = TreeLimits {
        max_children: args.max_children.unwrap_or(defaults.max_children),
        max_depth: args.max_depth.unwrap_or(defaults.max_depth),
    };

    let root = match args.item {
        Some(item) => item,
        None => pick_root(&graph, args.complexity, args.seed.or(config.seed))?,
    };

    if args.routing {
        let tree = build_routing_tree_with_limits(&graph, &root, limits)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree).into_diagnostic()?),
            OutputFormat::Yaml => print!("{}", serde_yml::to_string(&tree).into_diagnostic()?),
            _ => {
                print!("{}", render_routing_tree(&tree));
                if !global.quiet {
                    println!();
                    println!(
                        "{} {} nodes",
                        style("Summary").bold(),
                        tree.node_count()
                    );
                }
            }
        }
        return Ok(());
    }

    apply_process_costs(&mut graph)?;
    roll_up_costs(&mut graph)?;
    let tree = build_cost_tree_with_limits(&graph, &root, limits)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&tree).into_diagnostic()?),
        _ => {
            print!("{}", render_cost_tree(&tree));
            if !global.quiet {
                println!();
                println!(
                    "{} {} nodes, total cost {}",
                    style("Summary").bold(),
                    tree.node_count(),
                    format_cost(tree.cost)
                );
            }
        }
    }
    Ok(())
}

/// Random top-level assembly, optionally of one complexity
pub(crate) fn pick_root(
    graph: &BomGraph,
    complexity: Option<Complexity>,
    seed: Option<u64>,
) -> Result<String> {
    let tops = graph.top_level_assemblies(complexity);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    tops.choose(&mut rng)
        .map(|item| item.item_no.clone())
        .ok_or_else(|| match complexity {
            Some(c) => miette::miette!("No top-level assemblies with complexity {}", c),
            None => miette::miette!("No top-level assemblies in snapshot"),
        })
}

/// A node that can be printed as one line of an indented tree
trait TreeLine: Sized {
    fn line(&self) -> String;
    fn kids(&self) -> &[Self];
}

impl TreeLine for CostNode {
    fn line(&self) -> String {
        format!(
            "{}: {} {}",
            style(&self.item_no).cyan(),
            self.description,
            style(format_cost(self.cost)).green()
        )
    }

    fn kids(&self) -> &[Self] {
        &self.children
    }
}

impl TreeLine for RoutingNode {
    fn line(&self) -> String {
        let used: Vec<String> = self
            .used_work_centers()
            .map(|(wc, minutes)| format!("{wc} {minutes:.1}m"))
            .collect();
        let time = if used.is_empty() {
            String::new()
        } else {
            format!(
                " [{}] {}",
                used.join(", "),
                style(format_seconds(self.total_time * 60.0)).dim()
            )
        };
        format!(
            "{} ({}): {}{}",
            style(&self.item_no).cyan(),
            self.item_type.code(),
            self.description,
            time
        )
    }

    fn kids(&self) -> &[Self] {
        &self.children
    }
}

fn render_cost_tree(root: &CostNode) -> String {
    let mut out = format!(
        "{} {} {}\n",
        style(&root.item_no).yellow(),
        root.description,
        style(format_cost(root.cost)).green()
    );
    push_children(&mut out, root.kids(), "");
    out
}

fn render_routing_tree(root: &RoutingNode) -> String {
    let mut out = format!("{}\n", root.line());
    push_children(&mut out, root.kids(), "");
    out
}

fn push_children<N: TreeLine>(out: &mut String, children: &[N], prefix: &str) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let branch = if is_last { "└─ " } else { "├─ " };
        out.push_str(&format!("{}{}{}\n", prefix, branch, child.line()));

        let next = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
        push_children(out, child.kids(), &next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(item_no: &str, cost: f64) -> CostNode {
        CostNode {
            item_no: item_no.into(),
            description: format!("{item_no} desc"),
            cost: Some(cost),
            level: 1,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_render_cost_tree_branches() {
        console::set_colors_enabled(false);
        let mut sub = leaf("A2", 10.0);
        sub.children.push(leaf("P3", 1.0));
        let root = CostNode {
            item_no: "A1".into(),
            description: "top".into(),
            cost: Some(20.0),
            level: 0,
            children: vec![leaf("P1", 2.0), sub],
        };

        let text = render_cost_tree(&root);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A1 top 20.00");
        assert_eq!(lines[1], "├─ P1: P1 desc 2.00");
        assert_eq!(lines[2], "└─ A2: A2 desc 10.00");
        assert_eq!(lines[3], "   └─ P3: P3 desc 1.00");
    }
}
