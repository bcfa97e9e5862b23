//! Nested cost and routing trees for one root item
//!
//! Expansion runs over an explicit stack into a flat arena, then the arena is
//! folded into an owned tree from the last node back to the root. Neither
//! step recurses, so deep structures cannot exhaust the call stack.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{CostError, CostResult};
use crate::core::graph::BomGraph;
use crate::entities::{Item, ItemKind};

/// Bounds on tree expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeLimits {
    /// Children kept per node, in BOM line order
    pub max_children: usize,
    /// Deepest level that is expanded (root is level 0)
    pub max_depth: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_children: 200,
            max_depth: 256,
        }
    }
}

impl TreeLimits {
    pub fn with_max_children(max_children: usize) -> Self {
        Self {
            max_children,
            ..Self::default()
        }
    }
}

/// One item in a cost tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostNode {
    pub item_no: String,
    pub description: String,
    /// Rolled-up total, `None` until the roll-up has run
    pub cost: Option<f64>,
    pub level: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CostNode>,
}

/// One item in a routing tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingNode {
    pub item_no: String,
    pub description: String,
    pub item_type: ItemKind,
    pub level: usize,
    /// Minutes per work center at this node; every known work center is present
    pub work_centers: BTreeMap<String, f64>,
    /// Sum of all routing minutes at this node
    pub total_time: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RoutingNode>,
}

impl CostNode {
    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        count_nodes(self, |n| &n.children)
    }
}

impl RoutingNode {
    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        count_nodes(self, |n| &n.children)
    }

    /// Pre-order walk of the subtree
    pub fn nodes(&self) -> Vec<&RoutingNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Work centers with time recorded at this node
    pub fn used_work_centers(&self) -> impl Iterator<Item = (&str, f64)> {
        self.work_centers
            .iter()
            .filter(|(_, minutes)| **minutes > 0.0)
            .map(|(wc, minutes)| (wc.as_str(), *minutes))
    }
}

fn count_nodes<N>(root: &N, children: impl Fn(&N) -> &Vec<N>) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(children(node).iter());
    }
    count
}

/// Flat expansion record
struct Slot {
    item: usize,
    level: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

fn expand(graph: &BomGraph, root: &str, limits: TreeLimits) -> CostResult<Vec<Slot>> {
    let root_pos = graph
        .item_position(root)
        .ok_or_else(|| CostError::UnknownItem {
            item_no: root.to_string(),
        })?;

    let items = graph.items();
    let mut arena = vec![Slot {
        item: root_pos,
        level: 0,
        parent: None,
        children: Vec::new(),
    }];
    let mut stack = vec![0usize];

    while let Some(idx) = stack.pop() {
        let level = arena[idx].level;
        let item = &items[arena[idx].item];
        let Some(bom) = graph.costable_bom_for(&item.item_no) else {
            continue;
        };
        if level >= limits.max_depth {
            if !bom.lines.is_empty() {
                warn!(
                    item = %item.item_no,
                    max_depth = limits.max_depth,
                    omitted = bom.lines.len(),
                    "depth limit reached, components not expanded"
                );
            }
            continue;
        }

        if bom.lines.len() > limits.max_children {
            debug!(
                item = %item.item_no,
                shown = limits.max_children,
                omitted = bom.lines.len() - limits.max_children,
                "child limit reached"
            );
        }

        for line in bom.lines.iter().take(limits.max_children) {
            let child_pos = graph.item_position(&line.component).ok_or_else(|| {
                CostError::UnresolvedComponent {
                    bom_no: bom.bom_no.clone(),
                    component: line.component.clone(),
                }
            })?;

            if let Some(path) = ancestor_path(&arena, items, idx, child_pos) {
                return Err(CostError::CycleDetected { path });
            }

            let child = arena.len();
            arena.push(Slot {
                item: child_pos,
                level: level + 1,
                parent: Some(idx),
                children: Vec::new(),
            });
            arena[idx].children.push(child);
            stack.push(child);
        }
    }

    Ok(arena)
}

/// Root-to-node path closing on `item` if it is already an ancestor of `idx`
fn ancestor_path(arena: &[Slot], items: &[Item], idx: usize, item: usize) -> Option<Vec<String>> {
    let mut chain = Vec::new();
    let mut cursor = Some(idx);
    let mut found = false;
    while let Some(at) = cursor {
        chain.push(arena[at].item);
        if arena[at].item == item {
            found = true;
            break;
        }
        cursor = arena[at].parent;
    }
    if !found {
        return None;
    }
    chain.reverse();
    chain.push(item);
    Some(chain.into_iter().map(|i| items[i].item_no.clone()).collect())
}

/// Fold the arena into owned nodes; children always sit after their parent
fn assemble<N>(
    arena: Vec<Slot>,
    mut make: impl FnMut(&Slot, Vec<N>) -> CostResult<N>,
) -> CostResult<N> {
    let mut built: Vec<Option<N>> = Vec::with_capacity(arena.len());
    built.resize_with(arena.len(), || None);

    for idx in (0..arena.len()).rev() {
        let children = arena[idx]
            .children
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[idx] = Some(make(&arena[idx], children)?);
    }

    built
        .into_iter()
        .next()
        .flatten()
        .ok_or_else(|| CostError::UnknownItem {
            item_no: String::new(),
        })
}

/// Cost tree with the default depth bound
pub fn build_cost_tree(graph: &BomGraph, root: &str, max_children: usize) -> CostResult<CostNode> {
    build_cost_tree_with_limits(graph, root, TreeLimits::with_max_children(max_children))
}

pub fn build_cost_tree_with_limits(
    graph: &BomGraph,
    root: &str,
    limits: TreeLimits,
) -> CostResult<CostNode> {
    let arena = expand(graph, root, limits)?;
    let items = graph.items();
    assemble(arena, |slot, children| {
        let item = &items[slot.item];
        Ok(CostNode {
            item_no: item.item_no.clone(),
            description: item.description.clone(),
            cost: item.total_cost(),
            level: slot.level,
            children,
        })
    })
}

/// Routing tree with the default depth bound
pub fn build_routing_tree(
    graph: &BomGraph,
    root: &str,
    max_children: usize,
) -> CostResult<RoutingNode> {
    build_routing_tree_with_limits(graph, root, TreeLimits::with_max_children(max_children))
}

pub fn build_routing_tree_with_limits(
    graph: &BomGraph,
    root: &str,
    limits: TreeLimits,
) -> CostResult<RoutingNode> {
    let arena = expand(graph, root, limits)?;
    let items = graph.items();
    let blank: BTreeMap<String, f64> = graph
        .work_centers()
        .iter()
        .map(|wc| (wc.wc_no.clone(), 0.0))
        .collect();

    assemble(arena, |slot, children| {
        let item = &items[slot.item];
        let mut work_centers = blank.clone();
        let mut total_time = 0.0;

        if let Some(bom) = graph.bom_for(&item.item_no) {
            for step in &bom.routing {
                if !(step.run_time_min >= 0.0 && step.run_time_min.is_finite()) {
                    return Err(CostError::InvalidRunTime {
                        bom_no: bom.bom_no.clone(),
                        step_no: step.step_no,
                        run_time_min: step.run_time_min,
                    });
                }
                let minutes = work_centers.get_mut(&step.wc).ok_or_else(|| {
                    CostError::MissingWorkCenter {
                        bom_no: bom.bom_no.clone(),
                        step_no: step.step_no,
                        wc_no: step.wc.clone(),
                    }
                })?;
                *minutes += step.run_time_min;
                total_time += step.run_time_min;
            }
        }

        Ok(RoutingNode {
            item_no: item.item_no.clone(),
            description: item.description.clone(),
            item_type: item.kind,
            level: slot.level,
            work_centers,
            total_time,
            children,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::fixtures::*;
    use crate::core::rollup::roll_up_costs;
    use crate::core::routing::apply_process_costs;
    use crate::core::snapshot::Snapshot;
    use crate::entities::{Bom, Complexity};

    fn ids<'a>(children: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
        children.collect()
    }

    fn wide_graph(components: usize) -> BomGraph {
        let mut bom = Bom::new("B_WIDE", "WIDE", 0, Complexity::Simple);
        let mut snap = Snapshot::default().item(Item::assembly("WIDE", "Wide assembly", 1.0));
        for i in 0..components {
            let no = format!("P{i:03}");
            snap = snap.item(Item::part(no.as_str(), "part", 1.0));
            bom.add_line(no, 1);
        }
        BomGraph::from_snapshot(snap.bom(bom)).unwrap()
    }

    #[test]
    fn test_cost_tree_shape() {
        let mut graph = three_level_graph();
        apply_process_costs(&mut graph).unwrap();
        roll_up_costs(&mut graph).unwrap();

        let tree = build_cost_tree(&graph, "A001", 200).unwrap();
        assert_eq!(tree.level, 0);
        assert!((tree.cost.unwrap() - 94.5).abs() < 1e-9);
        assert_eq!(
            ids(tree.children.iter().map(|c| c.item_no.as_str())),
            vec!["P0001", "A002"]
        );

        let a002 = &tree.children[1];
        assert_eq!(a002.level, 1);
        let a003 = &a002.children[1];
        assert_eq!(a003.item_no, "A003");
        assert_eq!(a003.level, 2);
        assert_eq!(
            ids(a003.children.iter().map(|c| c.item_no.as_str())),
            vec!["P0003", "P0001"]
        );
        assert_eq!(tree.node_count(), 7);
    }

    #[test]
    fn test_cost_is_none_before_rollup() {
        let graph = three_level_graph();
        let tree = build_cost_tree(&graph, "A001", 200).unwrap();
        assert!(tree.cost.is_none());
    }

    #[test]
    fn test_child_cap_keeps_first_lines() {
        let graph = wide_graph(5);
        let tree = build_cost_tree(&graph, "WIDE", 3).unwrap();
        assert_eq!(tree.children.len(), 3);
        assert_eq!(
            ids(tree.children.iter().map(|c| c.item_no.as_str())),
            vec!["P000", "P001", "P002"]
        );

        let full = build_cost_tree(&graph, "WIDE", 200).unwrap();
        assert_eq!(full.children.len(), 5);
    }

    #[test]
    fn test_depth_limit() {
        let graph = three_level_graph();
        let limits = TreeLimits {
            max_children: 200,
            max_depth: 1,
        };
        let tree = build_cost_tree_with_limits(&graph, "A001", limits).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children.iter().all(|c| c.children.is_empty()));
    }

    fn chain_graph(assemblies: usize) -> BomGraph {
        let mut snap = Snapshot::default().item(Item::part("P_END", "chain end", 1.0));
        for i in 0..assemblies {
            let no = format!("A{i}");
            let next = if i + 1 == assemblies {
                "P_END".to_string()
            } else {
                format!("A{}", i + 1)
            };
            let depth = (assemblies - i) as u32;
            snap = snap
                .item(Item::assembly(no.as_str(), "link", 1.0))
                .bom(Bom::new(format!("B_{no}"), no.as_str(), depth, Complexity::Complex).with_line(next, 1));
        }
        BomGraph::from_snapshot(snap).unwrap()
    }

    #[test]
    fn test_deep_chain_fully_expanded_by_default() {
        let graph = chain_graph(40);
        let tree = build_cost_tree(&graph, "A0", 200).unwrap();
        assert_eq!(tree.node_count(), 41);

        let routing = build_routing_tree(&graph, "A0", 200).unwrap();
        let deepest = routing.nodes().iter().map(|n| n.level).max().unwrap();
        assert_eq!(deepest, 40);
    }

    #[test]
    fn test_chain_deeper_than_limit_stops_at_limit() {
        crate::core::logging::init_test();
        let graph = chain_graph(40);
        let limits = TreeLimits {
            max_children: 200,
            max_depth: 10,
        };
        let tree = build_cost_tree_with_limits(&graph, "A0", limits).unwrap();
        assert_eq!(tree.node_count(), 11);
    }

    #[test]
    fn test_item_without_bom_is_leaf() {
        let graph = three_level_graph();
        let tree = build_cost_tree(&graph, "P0002", 200).unwrap();
        assert!(tree.children.is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_unknown_root() {
        let graph = three_level_graph();
        let err = build_cost_tree(&graph, "A999", 200).unwrap_err();
        assert_eq!(err, CostError::UnknownItem { item_no: "A999".into() });
    }

    #[test]
    fn test_unknown_component() {
        let snap = Snapshot::default()
            .item(Item::assembly("A1", "A1", 1.0))
            .bom(Bom::new("B1", "A1", 0, Complexity::Simple).with_line("GHOST", 1));
        let graph = BomGraph::from_snapshot(snap).unwrap();
        assert!(matches!(
            build_routing_tree(&graph, "A1", 200),
            Err(CostError::UnresolvedComponent { .. })
        ));
    }

    #[test]
    fn test_cycle_in_tree() {
        let snap = Snapshot::default()
            .item(Item::assembly("A1", "A1", 1.0))
            .item(Item::assembly("A2", "A2", 1.0))
            .bom(Bom::new("B1", "A1", 1, Complexity::Simple).with_line("A2", 1))
            .bom(Bom::new("B2", "A2", 0, Complexity::Simple).with_line("A1", 1));
        let graph = BomGraph::from_snapshot(snap).unwrap();
        let err = build_cost_tree(&graph, "A1", 200).unwrap_err();
        assert_eq!(
            err,
            CostError::CycleDetected {
                path: vec!["A1".into(), "A2".into(), "A1".into()]
            }
        );
    }

    #[test]
    fn test_shared_component_is_not_a_cycle() {
        // P0001 appears under A001 and under A003
        let graph = three_level_graph();
        assert!(build_routing_tree(&graph, "A001", 200).is_ok());
    }

    #[test]
    fn test_routing_tree_work_centers() {
        let graph = three_level_graph();
        let tree = build_routing_tree(&graph, "A001", 200).unwrap();

        assert_eq!(tree.item_type, ItemKind::Assembly);
        assert_eq!(tree.work_centers.len(), 3);
        assert_eq!(tree.work_centers["WC01"], 0.0);
        assert_eq!(tree.work_centers["WC05"], 10.0);
        assert_eq!(tree.work_centers["WC06"], 5.0);
        assert_eq!(tree.total_time, 15.0);

        // part routing shows up on the part's node
        let p0001 = &tree.children[0];
        assert_eq!(p0001.item_type, ItemKind::Part);
        assert_eq!(p0001.work_centers["WC01"], 4.0);
        assert_eq!(p0001.total_time, 4.0);
        assert_eq!(ids(p0001.used_work_centers().map(|(wc, _)| wc)), vec!["WC01"]);
    }

    #[test]
    fn test_routing_step_at_unknown_work_center() {
        let snap = Snapshot::default()
            .work_center(crate::entities::WorkCenter::new("WC01", "Cutting", 0.15))
            .item(Item::assembly("A1", "A1", 1.0))
            .bom(Bom::new("B1", "A1", 0, Complexity::Simple).with_step("WC99", 5.0));
        let graph = BomGraph::from_snapshot(snap).unwrap();
        assert_eq!(
            build_routing_tree(&graph, "A1", 200).unwrap_err(),
            CostError::MissingWorkCenter {
                bom_no: "B1".into(),
                step_no: 1,
                wc_no: "WC99".into(),
            }
        );
    }

    #[test]
    fn test_steps_on_same_work_center_are_summed() {
        let snap = Snapshot::default()
            .work_center(crate::entities::WorkCenter::new("WC05", "Assembly", 0.4))
            .item(Item::assembly("A1", "A1", 1.0))
            .bom(
                Bom::new("B1", "A1", 0, Complexity::Simple)
                    .with_step("WC05", 3.0)
                    .with_step("WC05", 4.5),
            );
        let graph = BomGraph::from_snapshot(snap).unwrap();
        let tree = build_routing_tree(&graph, "A1", 200).unwrap();
        assert_eq!(tree.work_centers["WC05"], 7.5);
        assert_eq!(tree.total_time, 7.5);
    }

    #[test]
    fn test_nodes_preorder() {
        let graph = three_level_graph();
        let tree = build_routing_tree(&graph, "A001", 200).unwrap();
        let order: Vec<&str> = tree.nodes().iter().map(|n| n.item_no.as_str()).collect();
        assert_eq!(
            order,
            vec!["A001", "P0001", "A002", "P0002", "A003", "P0003", "P0001"]
        );
        assert_eq!(tree.node_count(), 7);
    }
}
