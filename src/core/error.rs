//! Structural errors raised by the costing core

use miette::Diagnostic;
use thiserror::Error;

/// Errors that abort a roll-up, routing, tree or simulation operation
///
/// `UnknownItem` and `UnknownBom` mean "no such structure"; every other
/// variant means the structure exists but is malformed.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum CostError {
    #[error("Item not found: {item_no}")]
    #[diagnostic(code(bomsim::graph::unknown_item))]
    UnknownItem { item_no: String },

    #[error("BOM not found: {bom_no}")]
    #[diagnostic(code(bomsim::graph::unknown_bom))]
    UnknownBom { bom_no: String },

    #[error("BOM cycle detected: {}", path.join(" -> "))]
    #[diagnostic(
        code(bomsim::graph::cycle),
        help("An assembly cannot contain itself, directly or through a sub-assembly")
    )]
    CycleDetected { path: Vec<String> },

    #[error("Routing step {step_no} of {bom_no} references unknown work center {wc_no}")]
    #[diagnostic(
        code(bomsim::routing::missing_work_center),
        help("Add the work center to the snapshot or fix the step's `wc` field")
    )]
    MissingWorkCenter {
        bom_no: String,
        step_no: u32,
        wc_no: String,
    },

    #[error("BOM {bom_no} references component {component} which has no cost")]
    #[diagnostic(
        code(bomsim::rollup::unresolved_component),
        help("Every BOM line must point at an item present in the snapshot")
    )]
    UnresolvedComponent { bom_no: String, component: String },

    #[error("Duplicate item number: {item_no}")]
    #[diagnostic(code(bomsim::graph::duplicate_item))]
    DuplicateItem { item_no: String },

    #[error("Duplicate BOM number: {bom_no}")]
    #[diagnostic(code(bomsim::graph::duplicate_bom_no))]
    DuplicateBomNo { bom_no: String },

    #[error("Item {item_no} has more than one BOM ({first} and {second})")]
    #[diagnostic(
        code(bomsim::graph::duplicate_bom),
        help("Each item owns at most one BOM; merge the lines into one")
    )]
    DuplicateBom {
        item_no: String,
        first: String,
        second: String,
    },

    #[error("Duplicate work center number: {wc_no}")]
    #[diagnostic(code(bomsim::graph::duplicate_work_center))]
    DuplicateWorkCenter { wc_no: String },

    #[error("BOM {bom_no} belongs to unknown item {parent}")]
    #[diagnostic(code(bomsim::graph::orphan_bom))]
    OrphanBom { bom_no: String, parent: String },

    #[error("BOM {bom_no} line for {component} has quantity {quantity}")]
    #[diagnostic(
        code(bomsim::graph::invalid_quantity),
        help("BOM line quantities must be at least 1")
    )]
    InvalidQuantity {
        bom_no: String,
        component: String,
        quantity: u32,
    },

    #[error("Routing step {step_no} of {bom_no} has invalid run time {run_time_min}")]
    #[diagnostic(
        code(bomsim::routing::invalid_run_time),
        help("Run times are minutes and must be zero or positive")
    )]
    InvalidRunTime {
        bom_no: String,
        step_no: u32,
        run_time_min: f64,
    },

    #[error("Work center {wc_no} has invalid cost rate {cost_per_min}")]
    #[diagnostic(code(bomsim::graph::invalid_cost_rate))]
    InvalidCostRate { wc_no: String, cost_per_min: f64 },

    #[error(
        "Depth of {child_bom} ({child_depth}) is not below its parent {parent_bom} ({parent_depth})"
    )]
    #[diagnostic(
        code(bomsim::rollup::depth_violation),
        help("A sub-assembly BOM must have a strictly smaller depth than every BOM using it")
    )]
    DepthViolation {
        parent_bom: String,
        parent_depth: u32,
        child_bom: String,
        child_depth: u32,
    },

    #[error("Invalid simulation model: {reason}")]
    #[diagnostic(code(bomsim::sim::invalid_model))]
    InvalidModel { reason: String },

    #[error("No simulation data to summarize")]
    #[diagnostic(
        code(bomsim::stats::no_data),
        help("Run at least one trial on an assembly with a BOM")
    )]
    NoData,
}

impl CostError {
    /// True when the error means the requested structure does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CostError::UnknownItem { .. } | CostError::UnknownBom { .. })
    }
}

pub type CostResult<T> = Result<T, CostError>;
