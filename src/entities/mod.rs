//! Entity type definitions
//!
//! - [`Item`] - Parts and assemblies with base, process and rolled-up cost
//! - [`Bom`] - Component lines and routing of one manufactured item
//! - [`WorkCenter`] - Stations with a per-minute cost used by routing steps

pub mod bom;
pub mod item;
pub mod work_center;

pub use bom::{Bom, BomLine, Complexity, RoutingStep};
pub use item::{Item, ItemKind};
pub use work_center::WorkCenter;
