//! Parameters of the quoting process

use serde::{Deserialize, Serialize};

use crate::core::error::{CostError, CostResult};

/// Largest mean or spread accepted for a per-step interaction count
pub const MAX_INTERACTIONS: f64 = 10_000.0;

/// Normal distribution parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub mean: f64,
    pub std_dev: f64,
}

impl Gaussian {
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    fn validate(&self, what: &str) -> CostResult<()> {
        if !self.mean.is_finite() || self.mean < 0.0 {
            return Err(invalid(format!("{what} mean must be a non-negative number")));
        }
        if !self.std_dev.is_finite() || self.std_dev < 0.0 {
            return Err(invalid(format!(
                "{what} standard deviation must be a non-negative number"
            )));
        }
        Ok(())
    }

    fn validate_count(&self, what: &str) -> CostResult<()> {
        self.validate(what)?;
        if self.mean > MAX_INTERACTIONS || self.std_dev > MAX_INTERACTIONS {
            return Err(invalid(format!(
                "{what} must not exceed {MAX_INTERACTIONS} interactions"
            )));
        }
        Ok(())
    }
}

/// One repeated manual step: how many interactions, and how long each takes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseModel {
    /// Planned interactions per step, rounded and clamped at zero
    pub interactions: Gaussian,
    /// Minutes per interaction, clamped at zero
    pub minutes_per_interaction: Gaussian,
}

/// How mistakes happen and get caught
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorModel {
    /// Lower bound of the per-interaction error probability
    pub min_probability: f64,
    /// Upper bound of the per-interaction error probability
    pub max_probability: f64,
    /// Chance an error is noticed on the spot
    #[serde(default = "default_detection")]
    pub detection_probability: f64,
    /// Rework interactions one step may add before giving up
    #[serde(default = "default_rework_ceiling")]
    pub max_rework_per_step: u32,
}

fn default_detection() -> f64 {
    0.5
}

fn default_rework_ceiling() -> u32 {
    100
}

/// Final assembly of the quote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompilationModel {
    /// Minutes for the aggregation itself
    pub minutes: Gaussian,
    /// Fixed number of entries made while aggregating
    pub entries: u32,
    /// Minutes per node when the result is re-keyed into another system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<Gaussian>,
}

/// Complete parameter set for one variant of the quoting process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteModel {
    pub name: String,
    pub cad: PhaseModel,
    pub work_center_entry: PhaseModel,
    pub compilation: CompilationModel,
    pub errors: ErrorModel,
}

impl QuoteModel {
    /// Fully manual process: read drawings, key every work center, compile
    /// in a spreadsheet and re-key the result
    pub fn manual() -> Self {
        Self {
            name: "manual".to_string(),
            cad: PhaseModel {
                interactions: Gaussian::new(8.0, 2.0),
                minutes_per_interaction: Gaussian::new(0.375, 0.0625),
            },
            work_center_entry: PhaseModel {
                interactions: Gaussian::new(4.0, 1.0),
                minutes_per_interaction: Gaussian::new(0.25, 0.0625),
            },
            compilation: CompilationModel {
                minutes: Gaussian::new(1.5, 0.33),
                entries: 8,
                transcription: Some(Gaussian::new(0.75, 0.17)),
            },
            errors: ErrorModel {
                min_probability: 0.01,
                max_probability: 0.05,
                detection_probability: default_detection(),
                max_rework_per_step: default_rework_ceiling(),
            },
        }
    }

    /// Costing software fed from the routing: fewer and faster interactions,
    /// no re-keying
    pub fn software_assisted() -> Self {
        Self {
            name: "software_assisted".to_string(),
            cad: PhaseModel {
                interactions: Gaussian::new(4.0, 1.0),
                minutes_per_interaction: Gaussian::new(0.25, 0.05),
            },
            work_center_entry: PhaseModel {
                interactions: Gaussian::new(2.0, 0.5),
                minutes_per_interaction: Gaussian::new(0.15, 0.03),
            },
            compilation: CompilationModel {
                minutes: Gaussian::new(0.5, 0.1),
                entries: 2,
                transcription: None,
            },
            errors: ErrorModel {
                min_probability: 0.005,
                max_probability: 0.02,
                detection_probability: default_detection(),
                max_rework_per_step: default_rework_ceiling(),
            },
        }
    }

    /// Reject parameters the simulator cannot sample from
    pub fn validate(&self) -> CostResult<()> {
        self.cad.interactions.validate_count("cad.interactions")?;
        self.cad
            .minutes_per_interaction
            .validate("cad.minutes_per_interaction")?;
        self.work_center_entry
            .interactions
            .validate_count("work_center_entry.interactions")?;
        self.work_center_entry
            .minutes_per_interaction
            .validate("work_center_entry.minutes_per_interaction")?;
        self.compilation.minutes.validate("compilation.minutes")?;
        if f64::from(self.compilation.entries) > MAX_INTERACTIONS {
            return Err(invalid(format!(
                "compilation.entries must not exceed {MAX_INTERACTIONS}"
            )));
        }
        if let Some(transcription) = &self.compilation.transcription {
            transcription.validate("compilation.transcription")?;
        }

        let e = &self.errors;
        let in_unit = |p: f64| (0.0..=1.0).contains(&p);
        if !in_unit(e.min_probability) || !in_unit(e.max_probability) {
            return Err(invalid("error probabilities must lie in [0, 1]".to_string()));
        }
        if e.min_probability > e.max_probability {
            return Err(invalid(format!(
                "error probability range is inverted ({} > {})",
                e.min_probability, e.max_probability
            )));
        }
        if !in_unit(e.detection_probability) {
            return Err(invalid("detection probability must lie in [0, 1]".to_string()));
        }
        Ok(())
    }
}

impl Default for QuoteModel {
    fn default() -> Self {
        Self::manual()
    }
}

fn invalid(reason: String) -> CostError {
    CostError::InvalidModel { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(QuoteModel::manual().validate().is_ok());
        assert!(QuoteModel::software_assisted().validate().is_ok());
    }

    #[test]
    fn test_software_is_lighter_than_manual() {
        let manual = QuoteModel::manual();
        let sw = QuoteModel::software_assisted();
        assert!(sw.cad.interactions.mean < manual.cad.interactions.mean);
        assert!(sw.work_center_entry.interactions.mean < manual.work_center_entry.interactions.mean);
        assert!(manual.compilation.transcription.is_some());
        assert!(sw.compilation.transcription.is_none());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut model = QuoteModel::manual();
        model.errors.min_probability = 0.2;
        model.errors.max_probability = 0.1;
        assert!(matches!(model.validate(), Err(CostError::InvalidModel { .. })));
    }

    #[test]
    fn test_negative_std_dev_rejected() {
        let mut model = QuoteModel::manual();
        model.cad.minutes_per_interaction.std_dev = -1.0;
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("cad.minutes_per_interaction"));
    }

    #[test]
    fn test_huge_interaction_count_rejected() {
        let mut model = QuoteModel::manual();
        model.cad.interactions.mean = 1e12;
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("cad.interactions"));

        let mut model = QuoteModel::manual();
        model.work_center_entry.interactions.std_dev = MAX_INTERACTIONS * 2.0;
        assert!(matches!(model.validate(), Err(CostError::InvalidModel { .. })));

        let mut model = QuoteModel::manual();
        model.cad.interactions.mean = MAX_INTERACTIONS;
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_model_from_yaml_uses_defaults() {
        let yaml = r#"
name: quick
cad:
  interactions: { mean: 2, std_dev: 0 }
  minutes_per_interaction: { mean: 0.5, std_dev: 0 }
work_center_entry:
  interactions: { mean: 1, std_dev: 0 }
  minutes_per_interaction: { mean: 0.5, std_dev: 0 }
compilation:
  minutes: { mean: 1, std_dev: 0 }
  entries: 3
errors:
  min_probability: 0.0
  max_probability: 0.0
"#;
        let model: QuoteModel = serde_yml::from_str(yaml).unwrap();
        assert_eq!(model.errors.detection_probability, 0.5);
        assert_eq!(model.errors.max_rework_per_step, 100);
        assert!(model.compilation.transcription.is_none());
        assert!(model.validate().is_ok());
    }
}
