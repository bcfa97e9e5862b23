//! Item entity - parts and assemblies carried in a BOM snapshot

use serde::{Deserialize, Serialize};

/// Item kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Purchased or manufactured part with no sub-structure
    #[default]
    #[serde(alias = "P")]
    Part,
    /// Item built from other items
    #[serde(alias = "A")]
    Assembly,
}

impl ItemKind {
    /// Single-letter code used in compact tables
    pub fn code(&self) -> &'static str {
        match self {
            ItemKind::Part => "P",
            ItemKind::Assembly => "A",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Part => write!(f, "part"),
            ItemKind::Assembly => write!(f, "assembly"),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "part" | "p" => Ok(ItemKind::Part),
            "assembly" | "a" => Ok(ItemKind::Assembly),
            _ => Err(format!("Unknown item kind: {}. Use part or assembly", s)),
        }
    }
}

/// A part or assembly
///
/// `process_cost` is owned by the routing calculator and `total_cost` by the
/// roll-up engine; outside the crate both are read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item number (e.g. "P0001", "A012")
    pub item_no: String,

    /// Human readable description
    #[serde(default)]
    pub description: String,

    /// Part or assembly
    #[serde(default)]
    pub kind: ItemKind,

    /// Purchase or raw material cost
    #[serde(default)]
    pub base_cost: f64,

    /// Manufacturing cost derived from routing
    #[serde(default)]
    pub(crate) process_cost: f64,

    /// Rolled-up cost, absent until computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) total_cost: Option<f64>,
}

impl Item {
    /// Create a new part
    pub fn part(item_no: impl Into<String>, description: impl Into<String>, base_cost: f64) -> Self {
        Self {
            item_no: item_no.into(),
            description: description.into(),
            kind: ItemKind::Part,
            base_cost,
            process_cost: 0.0,
            total_cost: None,
        }
    }

    /// Create a new assembly
    pub fn assembly(
        item_no: impl Into<String>,
        description: impl Into<String>,
        base_cost: f64,
    ) -> Self {
        Self {
            kind: ItemKind::Assembly,
            ..Self::part(item_no, description, base_cost)
        }
    }

    /// Seed a process cost for an item that has no routing of its own
    pub fn with_process_cost(mut self, process_cost: f64) -> Self {
        self.process_cost = process_cost;
        self
    }

    pub fn process_cost(&self) -> f64 {
        self.process_cost
    }

    pub fn total_cost(&self) -> Option<f64> {
        self.total_cost
    }

    /// Cost of the item on its own, ignoring any components
    pub fn own_cost(&self) -> f64 {
        self.base_cost + self.process_cost
    }

    pub fn is_assembly(&self) -> bool {
        self.kind == ItemKind::Assembly
    }
}
