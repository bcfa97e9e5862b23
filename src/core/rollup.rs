//! Bottom-up cost roll-up
//!
//! The order is derived from the BOM graph rather than from the stored
//! `depth`: a BOM's cost level is one more than the highest level among the
//! costable BOMs of its components, so every level only reads totals that
//! earlier levels finalized. BOMs within a level are independent and are
//! priced in parallel. Stored depths are checked separately by
//! [`validate_depths`].

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::core::error::{CostError, CostResult};
use crate::core::graph::BomGraph;
use crate::entities::Bom;

/// Outcome of a roll-up pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollupReport {
    /// Items costed as base + process only
    pub leaf_items: usize,
    /// Items costed from a BOM
    pub assemblies: usize,
    /// Number of dependency levels processed
    pub levels: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Position of the costable BOM owned by `component`, if any
fn dependency(graph: &BomGraph, component: &str) -> Option<usize> {
    graph
        .costable_bom_for(component)
        .and_then(|bom| graph.bom_position(&bom.bom_no))
}

/// Group costable BOM positions into dependency levels
///
/// Iterative depth-first traversal; meeting a BOM that is still on the
/// traversal stack means the structure contains itself.
fn cost_levels(graph: &BomGraph) -> CostResult<Vec<Vec<usize>>> {
    let boms = graph.boms();
    let mut mark = vec![Mark::New; boms.len()];
    let mut level = vec![0usize; boms.len()];
    let mut post_order = Vec::new();

    for start in 0..boms.len() {
        if !boms[start].is_costable() || mark[start] != Mark::New {
            continue;
        }

        // (bom position, index of the next line to visit)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        mark[start] = Mark::Active;

        while let Some(&(current, next)) = stack.last() {
            let lines = &boms[current].lines;
            if next < lines.len() {
                let top = stack.len() - 1;
                stack[top].1 += 1;

                let Some(dep) = dependency(graph, &lines[next].component) else {
                    continue;
                };
                match mark[dep] {
                    Mark::New => {
                        mark[dep] = Mark::Active;
                        stack.push((dep, 0));
                    }
                    Mark::Active => {
                        let from = stack.iter().position(|&(b, _)| b == dep).unwrap_or(0);
                        let mut path: Vec<String> = stack[from..]
                            .iter()
                            .map(|&(b, _)| boms[b].parent.clone())
                            .collect();
                        path.push(boms[dep].parent.clone());
                        return Err(CostError::CycleDetected { path });
                    }
                    Mark::Done => {}
                }
            } else {
                level[current] = lines
                    .iter()
                    .filter_map(|line| dependency(graph, &line.component))
                    .map(|dep| level[dep] + 1)
                    .max()
                    .unwrap_or(0);
                mark[current] = Mark::Done;
                post_order.push(current);
                stack.pop();
            }
        }
    }

    let height = post_order.iter().map(|&b| level[b] + 1).max().unwrap_or(0);
    let mut levels = vec![Vec::new(); height];
    for b in post_order {
        levels[level[b]].push(b);
    }
    Ok(levels)
}

/// Costable BOM numbers in an order where components precede their parents
pub fn topological_order(graph: &BomGraph) -> CostResult<Vec<String>> {
    let boms = graph.boms();
    Ok(cost_levels(graph)?
        .into_iter()
        .flatten()
        .map(|b| boms[b].bom_no.clone())
        .collect())
}

/// Structural height of every costable BOM, keyed by BOM number
///
/// These are the depths a consistent snapshot would store.
pub fn derive_depths(graph: &BomGraph) -> CostResult<Vec<(String, u32)>> {
    let boms = graph.boms();
    let mut depths = Vec::new();
    for (height, level) in cost_levels(graph)?.into_iter().enumerate() {
        for b in level {
            depths.push((boms[b].bom_no.clone(), height as u32));
        }
    }
    Ok(depths)
}

/// Every costable line whose component BOM is not strictly shallower
pub fn validate_depths(graph: &BomGraph) -> Vec<CostError> {
    let mut violations = Vec::new();
    for parent in graph.boms().iter().filter(|b| b.is_costable()) {
        for line in &parent.lines {
            if let Some(child) = graph.costable_bom_for(&line.component) {
                if child.depth >= parent.depth {
                    violations.push(CostError::DepthViolation {
                        parent_bom: parent.bom_no.clone(),
                        parent_depth: parent.depth,
                        child_bom: child.bom_no.clone(),
                        child_depth: child.depth,
                    });
                }
            }
        }
    }
    violations
}

/// Fail with the first depth violation, if any
pub fn check_depths(graph: &BomGraph) -> CostResult<()> {
    match validate_depths(graph).into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}

fn bom_total(graph: &BomGraph, bom: &Bom, staged: &[Option<f64>]) -> CostResult<(usize, f64)> {
    let owner = graph
        .item_position(&bom.parent)
        .ok_or_else(|| CostError::UnknownItem {
            item_no: bom.parent.clone(),
        })?;

    let mut total = graph.items()[owner].own_cost();
    for line in &bom.lines {
        let unresolved = || CostError::UnresolvedComponent {
            bom_no: bom.bom_no.clone(),
            component: line.component.clone(),
        };
        let position = graph.item_position(&line.component).ok_or_else(unresolved)?;
        let component_total = staged[position].ok_or_else(unresolved)?;
        total += component_total * f64::from(line.quantity);
    }
    Ok((owner, total))
}

/// Totals for every item, leaves first and then level by level
fn stage_totals(graph: &BomGraph, levels: &[Vec<usize>]) -> CostResult<(Vec<f64>, RollupReport)> {
    for bom in graph.boms().iter().filter(|b| !b.is_costable()) {
        if !bom.lines.is_empty() {
            warn!(
                bom = %bom.bom_no,
                lines = bom.lines.len(),
                "ignoring component lines on a part routing BOM"
            );
        }
    }

    let mut staged: Vec<Option<f64>> = graph
        .items()
        .iter()
        .map(|item| match graph.costable_bom_for(&item.item_no) {
            Some(_) => None,
            None => Some(item.own_cost()),
        })
        .collect();

    let mut report = RollupReport {
        leaf_items: staged.iter().filter(|t| t.is_some()).count(),
        assemblies: 0,
        levels: levels.len(),
    };

    let boms = graph.boms();
    for (height, level) in levels.iter().enumerate() {
        let totals = level
            .par_iter()
            .map(|&b| bom_total(graph, &boms[b], &staged))
            .collect::<CostResult<Vec<_>>>()?;

        debug!(level = height, boms = totals.len(), "rolled up level");
        report.assemblies += totals.len();
        for (owner, total) in totals {
            staged[owner] = Some(total);
        }
    }

    // every costable owner sits on some level, so nothing is left unset
    let totals = staged.into_iter().map(|t| t.unwrap_or(0.0)).collect();
    Ok((totals, report))
}

/// Compute `total_cost` for every item
///
/// Totals are staged and committed only when the whole pass succeeds, so a
/// cycle or an unresolved component leaves every item as it was.
pub fn roll_up_costs(graph: &mut BomGraph) -> CostResult<RollupReport> {
    let levels = cost_levels(graph)?;
    let (totals, report) = stage_totals(graph, &levels)?;

    for (item, total) in graph.items_mut().iter_mut().zip(totals) {
        item.total_cost = Some(total);
    }

    info!(
        leaf_items = report.leaf_items,
        assemblies = report.assemblies,
        levels = report.levels,
        "cost roll-up complete"
    );
    Ok(report)
}
