//! bomsim: BOM cost roll-up and quoting simulation
//!
//! Loads a snapshot of items, bills of materials and work centers, rolls
//! costs up the BOM tree, and runs Monte Carlo trials of the quoting
//! process to compare manual and software-assisted workflows.

pub mod cli;
pub mod core;
pub mod entities;
pub mod sim;
