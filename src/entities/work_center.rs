//! Work center entity

use serde::{Deserialize, Serialize};

/// A manufacturing station with a per-minute operating cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenter {
    /// Work center number (e.g. "WC01")
    pub wc_no: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Cost per minute of run time
    pub cost_per_min: f64,
}

impl WorkCenter {
    pub fn new(wc_no: impl Into<String>, name: impl Into<String>, cost_per_min: f64) -> Self {
        Self {
            wc_no: wc_no.into(),
            name: name.into(),
            cost_per_min,
        }
    }

    /// Cost of running this work center for `minutes`
    pub fn cost_for(&self, minutes: f64) -> f64 {
        self.cost_per_min * minutes
    }
}
