//! Core module - graph, costing passes and shared infrastructure

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod rollup;
pub mod routing;
pub mod snapshot;
pub mod tree;
pub mod validate;

pub use config::Config;
pub use error::{CostError, CostResult};
pub use graph::BomGraph;
pub use rollup::{check_depths, derive_depths, roll_up_costs, topological_order, validate_depths, RollupReport};
pub use routing::{apply_process_costs, compute_process_cost, price_routing, RoutingSummary};
pub use snapshot::{load_snapshot, parse_snapshot, render_snapshot, save_snapshot, Snapshot, SnapshotError, SnapshotFormat};
pub use tree::{
    build_cost_tree, build_cost_tree_with_limits, build_routing_tree, build_routing_tree_with_limits,
    CostNode, RoutingNode, TreeLimits,
};
pub use validate::validate_graph;
