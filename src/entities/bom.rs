//! BOM entity - structure and routing of one manufactured item

use serde::{Deserialize, Serialize};

/// Complexity tag of a BOM
///
/// Informational, except that `Part` BOMs carry manufacturing routing for a
/// part and never contribute component costs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
    Part,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Moderate => write!(f, "moderate"),
            Complexity::Complex => write!(f, "complex"),
            Complexity::Part => write!(f, "part"),
        }
    }
}

impl std::str::FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Complexity::Simple),
            "moderate" => Ok(Complexity::Moderate),
            "complex" => Ok(Complexity::Complex),
            "part" => Ok(Complexity::Part),
            _ => Err(format!(
                "Unknown complexity: {}. Use simple, moderate, complex, or part",
                s
            )),
        }
    }
}

/// BOM line - a component reference with quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    /// Component item number
    pub component: String,

    /// Quantity of the component per parent
    pub quantity: u32,
}

/// Routing step - one operation at a work center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingStep {
    /// Sequence number within the routing
    pub step_no: u32,

    /// Work center number
    pub wc: String,

    /// Run time in minutes
    pub run_time_min: f64,
}

/// BOM - one structural node per manufactured item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bom {
    /// Unique BOM number
    pub bom_no: String,

    /// Item number of the owning item
    pub parent: String,

    /// Structural height hint, see `core::rollup::validate_depths`
    #[serde(default)]
    pub depth: u32,

    /// Complexity tag
    #[serde(default)]
    pub complexity: Complexity,

    /// Component lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<BomLine>,

    /// Routing steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routing: Vec<RoutingStep>,
}

impl Bom {
    /// Create a new BOM for a parent item
    pub fn new(bom_no: impl Into<String>, parent: impl Into<String>, depth: u32, complexity: Complexity) -> Self {
        Self {
            bom_no: bom_no.into(),
            parent: parent.into(),
            depth,
            complexity,
            lines: Vec::new(),
            routing: Vec::new(),
        }
    }

    /// Add a component line
    pub fn add_line(&mut self, component: impl Into<String>, quantity: u32) {
        self.lines.push(BomLine {
            component: component.into(),
            quantity,
        });
    }

    /// Add a routing step, numbered after the existing ones
    pub fn add_step(&mut self, wc: impl Into<String>, run_time_min: f64) {
        let step_no = self.routing.len() as u32 + 1;
        self.routing.push(RoutingStep {
            step_no,
            wc: wc.into(),
            run_time_min,
        });
    }

    /// Builder form of [`Bom::add_line`]
    pub fn with_line(mut self, component: impl Into<String>, quantity: u32) -> Self {
        self.add_line(component, quantity);
        self
    }

    /// Builder form of [`Bom::add_step`]
    pub fn with_step(mut self, wc: impl Into<String>, run_time_min: f64) -> Self {
        self.add_step(wc, run_time_min);
        self
    }

    /// Whether this BOM contributes component costs to its parent
    pub fn is_costable(&self) -> bool {
        self.complexity != Complexity::Part
    }

    /// Total routing minutes
    pub fn total_run_time(&self) -> f64 {
        self.routing.iter().map(|s| s.run_time_min).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_builder() {
        let bom = Bom::new("BOM_S1_A001", "A001", 0, Complexity::Simple)
            .with_line("P0001", 4)
            .with_line("P0002", 2)
            .with_step("WC05", 9.0)
            .with_step("WC06", 6.0);

        assert_eq!(bom.lines.len(), 2);
        assert_eq!(bom.routing[1].step_no, 2);
        assert!((bom.total_run_time() - 15.0).abs() < 1e-12);
        assert!(bom.is_costable());
    }

    #[test]
    fn test_part_bom_not_costable() {
        let bom = Bom::new("MFG_P1_P0001", "P0001", 0, Complexity::Part);
        assert!(!bom.is_costable());
    }

    #[test]
    fn test_missing_complexity_defaults_to_simple() {
        let bom: Bom = serde_yml::from_str("bom_no: B1\nparent: A1\n").unwrap();
        assert_eq!(bom.complexity, Complexity::Simple);
        assert_eq!(Complexity::default(), Complexity::Simple);
    }

    #[test]
    fn test_complexity_parse() {
        assert_eq!("Complex".parse::<Complexity>().unwrap(), Complexity::Complex);
        assert!("tricky".parse::<Complexity>().is_err());
    }

    #[test]
    fn test_bom_roundtrip() {
        let bom = Bom::new("BOM_M1_A002", "A002", 1, Complexity::Moderate)
            .with_line("A003", 2)
            .with_step("WC01", 12.0);

        let yaml = serde_yml::to_string(&bom).unwrap();
        assert!(yaml.contains("complexity: moderate"));
        let parsed: Bom = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed, bom);
    }
}
