//! Routing cost calculator
//!
//! Process cost of a BOM is the sum of run time times work center rate over
//! its routing steps. Results replace the owner's `process_cost`.

use tracing::{debug, info};

use crate::core::error::{CostError, CostResult};
use crate::core::graph::BomGraph;
use crate::entities::Bom;

/// Summary of a routing pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingSummary {
    /// Number of items whose process cost was written
    pub items_updated: usize,
    /// Number of routing steps priced
    pub steps_priced: usize,
    /// Sum of all process costs written
    pub total_process_cost: f64,
}

/// Process cost for one BOM, looked up by number
pub fn compute_process_cost(graph: &BomGraph, bom_no: &str) -> CostResult<f64> {
    let bom = graph.bom(bom_no).ok_or_else(|| CostError::UnknownBom {
        bom_no: bom_no.to_string(),
    })?;
    price_routing(graph, bom)
}

/// Process cost for a BOM value
pub fn price_routing(graph: &BomGraph, bom: &Bom) -> CostResult<f64> {
    let mut total = 0.0;
    for step in &bom.routing {
        if !(step.run_time_min >= 0.0 && step.run_time_min.is_finite()) {
            return Err(CostError::InvalidRunTime {
                bom_no: bom.bom_no.clone(),
                step_no: step.step_no,
                run_time_min: step.run_time_min,
            });
        }
        let wc = graph
            .work_center(&step.wc)
            .ok_or_else(|| CostError::MissingWorkCenter {
                bom_no: bom.bom_no.clone(),
                step_no: step.step_no,
                wc_no: step.wc.clone(),
            })?;
        total += wc.cost_for(step.run_time_min);
    }
    Ok(total)
}

/// Price every BOM's routing and store it on the owning item
///
/// All BOMs are priced before anything is written, so a failure leaves
/// every `process_cost` unchanged.
pub fn apply_process_costs(graph: &mut BomGraph) -> CostResult<RoutingSummary> {
    let mut staged = Vec::with_capacity(graph.boms().len());
    let mut summary = RoutingSummary::default();

    for bom in graph.boms() {
        let cost = price_routing(graph, bom)?;
        let position = graph
            .item_position(&bom.parent)
            .ok_or_else(|| CostError::UnknownItem {
                item_no: bom.parent.clone(),
            })?;
        debug!(bom = %bom.bom_no, item = %bom.parent, cost, "priced routing");
        summary.steps_priced += bom.routing.len();
        summary.total_process_cost += cost;
        staged.push((position, cost));
    }

    let items = graph.items_mut();
    for (position, cost) in staged {
        items[position].process_cost = cost;
        summary.items_updated += 1;
    }

    info!(
        items = summary.items_updated,
        steps = summary.steps_priced,
        "applied process costs"
    );
    Ok(summary)
}
