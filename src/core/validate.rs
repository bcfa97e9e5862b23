//! Whole-graph structural check
//!
//! Runs every check the costing operations would trip over and reports all
//! findings instead of stopping at the first.

use std::collections::BTreeSet;

use crate::core::error::CostError;
use crate::core::graph::BomGraph;
use crate::core::rollup::{topological_order, validate_depths};
use crate::core::routing::price_routing;

/// Every structural problem in the graph, in a stable order
///
/// Covers dangling components, routing problems, cycles and stored depths
/// that disagree with the structure. Construction-time problems (duplicates,
/// orphans, zero quantities) never reach this point.
pub fn validate_graph(graph: &BomGraph) -> Vec<CostError> {
    let mut findings = Vec::new();

    for bom in graph.boms() {
        let mut seen = BTreeSet::new();
        for line in &bom.lines {
            if graph.item(&line.component).is_none() && seen.insert(line.component.as_str()) {
                findings.push(CostError::UnresolvedComponent {
                    bom_no: bom.bom_no.clone(),
                    component: line.component.clone(),
                });
            }
        }

        if let Err(e) = price_routing(graph, bom) {
            findings.push(e);
        }
    }

    match topological_order(graph) {
        Ok(_) => findings.extend(validate_depths(graph)),
        Err(cycle) => findings.push(cycle),
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::fixtures::*;
    use crate::entities::{Bom, Complexity, Item};

    #[test]
    fn test_clean_graph_has_no_findings() {
        assert!(validate_graph(&three_level_graph()).is_empty());
    }

    #[test]
    fn test_reports_all_findings() {
        let snap = three_level_snapshot()
            .item(Item::assembly("A900", "Broken", 1.0))
            .bom(
                Bom::new("BOM_A900", "A900", 0, Complexity::Simple)
                    .with_line("GHOST", 1)
                    .with_step("WC99", 1.0),
            )
            .item(Item::assembly("A901", "Flat", 1.0))
            .bom(Bom::new("BOM_A901", "A901", 0, Complexity::Simple).with_line("A003", 1));
        let graph = BomGraph::from_snapshot(snap).unwrap();

        let findings = validate_graph(&graph);
        assert_eq!(findings.len(), 3, "{findings:?}");
        assert!(matches!(findings[0], CostError::UnresolvedComponent { .. }));
        assert!(matches!(findings[1], CostError::MissingWorkCenter { .. }));
        assert!(matches!(findings[2], CostError::DepthViolation { .. }));
    }

    #[test]
    fn test_cycle_reported() {
        let snap = three_level_snapshot()
            .item(Item::assembly("A910", "Loop", 1.0))
            .bom(Bom::new("BOM_A910", "A910", 0, Complexity::Simple).with_line("A910", 1));
        let graph = BomGraph::from_snapshot(snap).unwrap();
        let findings = validate_graph(&graph);
        assert!(findings
            .iter()
            .any(|f| matches!(f, CostError::CycleDetected { .. })));
    }
}
