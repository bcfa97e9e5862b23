//! In-memory BOM graph
//!
//! Owns the items, BOMs and work centers of a snapshot and indexes them by
//! number. Construction checks the invariants that do not depend on the
//! operation being run; dangling component and work center references are
//! left for the operation that needs them to report.

use std::collections::{HashMap, HashSet};

use crate::core::error::{CostError, CostResult};
use crate::core::snapshot::Snapshot;
use crate::entities::{Bom, Complexity, Item, WorkCenter};

/// Indexed, validated view of a snapshot
#[derive(Debug, Clone)]
pub struct BomGraph {
    items: Vec<Item>,
    item_index: HashMap<String, usize>,
    boms: Vec<Bom>,
    bom_index: HashMap<String, usize>,
    bom_by_owner: HashMap<String, usize>,
    work_centers: Vec<WorkCenter>,
    wc_index: HashMap<String, usize>,
}

impl BomGraph {
    /// Build a graph, rejecting duplicates, orphans and invalid quantities
    pub fn from_snapshot(snapshot: Snapshot) -> CostResult<Self> {
        let Snapshot {
            work_centers,
            items,
            boms,
        } = snapshot;

        let mut wc_index = HashMap::with_capacity(work_centers.len());
        for (idx, wc) in work_centers.iter().enumerate() {
            if !(wc.cost_per_min >= 0.0 && wc.cost_per_min.is_finite()) {
                return Err(CostError::InvalidCostRate {
                    wc_no: wc.wc_no.clone(),
                    cost_per_min: wc.cost_per_min,
                });
            }
            if wc_index.insert(wc.wc_no.clone(), idx).is_some() {
                return Err(CostError::DuplicateWorkCenter {
                    wc_no: wc.wc_no.clone(),
                });
            }
        }

        let mut item_index = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if item_index.insert(item.item_no.clone(), idx).is_some() {
                return Err(CostError::DuplicateItem {
                    item_no: item.item_no.clone(),
                });
            }
        }

        let mut bom_index = HashMap::with_capacity(boms.len());
        let mut bom_by_owner: HashMap<String, usize> = HashMap::with_capacity(boms.len());
        for (idx, bom) in boms.iter().enumerate() {
            if bom_index.insert(bom.bom_no.clone(), idx).is_some() {
                return Err(CostError::DuplicateBomNo {
                    bom_no: bom.bom_no.clone(),
                });
            }
            if !item_index.contains_key(&bom.parent) {
                return Err(CostError::OrphanBom {
                    bom_no: bom.bom_no.clone(),
                    parent: bom.parent.clone(),
                });
            }
            if let Some(&first) = bom_by_owner.get(&bom.parent) {
                return Err(CostError::DuplicateBom {
                    item_no: bom.parent.clone(),
                    first: boms[first].bom_no.clone(),
                    second: bom.bom_no.clone(),
                });
            }
            bom_by_owner.insert(bom.parent.clone(), idx);

            if let Some(line) = bom.lines.iter().find(|l| l.quantity == 0) {
                return Err(CostError::InvalidQuantity {
                    bom_no: bom.bom_no.clone(),
                    component: line.component.clone(),
                    quantity: line.quantity,
                });
            }
        }

        Ok(Self {
            items,
            item_index,
            boms,
            bom_index,
            bom_by_owner,
            work_centers,
            wc_index,
        })
    }

    /// Hand the (possibly updated) data back as a snapshot
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            work_centers: self.work_centers.clone(),
            items: self.items.clone(),
            boms: self.boms.clone(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn boms(&self) -> &[Bom] {
        &self.boms
    }

    /// Work centers in snapshot order
    pub fn work_centers(&self) -> &[WorkCenter] {
        &self.work_centers
    }

    pub fn item(&self, item_no: &str) -> Option<&Item> {
        self.item_index.get(item_no).map(|&idx| &self.items[idx])
    }

    /// Look up an item or fail with `UnknownItem`
    pub fn require_item(&self, item_no: &str) -> CostResult<&Item> {
        self.item(item_no).ok_or_else(|| CostError::UnknownItem {
            item_no: item_no.to_string(),
        })
    }

    pub fn bom(&self, bom_no: &str) -> Option<&Bom> {
        self.bom_index.get(bom_no).map(|&idx| &self.boms[idx])
    }

    /// The BOM owned by an item, if any
    pub fn bom_for(&self, item_no: &str) -> Option<&Bom> {
        self.bom_by_owner.get(item_no).map(|&idx| &self.boms[idx])
    }

    /// The owned BOM if it contributes component costs
    pub fn costable_bom_for(&self, item_no: &str) -> Option<&Bom> {
        self.bom_for(item_no).filter(|b| b.is_costable())
    }

    pub fn work_center(&self, wc_no: &str) -> Option<&WorkCenter> {
        self.wc_index.get(wc_no).map(|&idx| &self.work_centers[idx])
    }

    pub(crate) fn item_position(&self, item_no: &str) -> Option<usize> {
        self.item_index.get(item_no).copied()
    }

    pub(crate) fn bom_position(&self, bom_no: &str) -> Option<usize> {
        self.bom_index.get(bom_no).copied()
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    /// Assemblies owning a costable BOM that no BOM uses as a component
    ///
    /// Sorted by item number so callers see a stable order.
    pub fn top_level_assemblies(&self, complexity: Option<Complexity>) -> Vec<&Item> {
        let used: HashSet<&str> = self
            .boms
            .iter()
            .flat_map(|b| b.lines.iter().map(|l| l.component.as_str()))
            .collect();

        let mut tops: Vec<&Item> = self
            .boms
            .iter()
            .filter(|b| b.is_costable())
            .filter(|b| complexity.map_or(true, |c| b.complexity == c))
            .filter(|b| !used.contains(b.parent.as_str()))
            .filter_map(|b| self.item(&b.parent))
            .filter(|item| item.is_assembly())
            .collect();
        tops.sort_by(|a, b| a.item_no.cmp(&b.item_no));
        tops
    }
}
