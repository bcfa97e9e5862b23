//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::tree::TreeLimits;
use crate::sim::QuoteModel;

/// Name of the project config file looked up in the working directory
pub const PROJECT_CONFIG: &str = "bomsim.yaml";

/// bomsim configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trials per simulated item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trials: Option<usize>,

    /// Base seed for reproducible simulation runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Children kept per tree node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_children: Option<usize>,

    /// Deepest tree level expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,

    /// Override of the manual quoting model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_model: Option<QuoteModel>,

    /// Override of the software-assisted quoting model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_model: Option<QuoteModel>,
}

impl Config {
    pub const DEFAULT_TRIALS: usize = 50;

    /// Load configuration from all sources, merging in priority order
    ///
    /// `explicit` replaces the project file lookup when given.
    pub fn load(explicit: Option<&Path>) -> Self {
        let project = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG));
        Self::load_from(
            Self::global_config_path().as_deref(),
            Some(project.as_path()),
            |key| std::env::var(key).ok(),
        )
    }

    /// Layered load with every source supplied by the caller
    pub fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/bomsim/config.yaml)
        if let Some(global) = global.and_then(Self::read_file) {
            config.merge(global);
        }

        // 3. Project config (./bomsim.yaml or --config)
        if let Some(project) = project.and_then(Self::read_file) {
            config.merge(project);
        }

        // 4. Environment variables
        if let Some(trials) = env_number(&env, "BOMSIM_TRIALS") {
            config.trials = Some(trials);
        }
        if let Some(seed) = env_number(&env, "BOMSIM_SEED") {
            config.seed = Some(seed);
        }
        if let Some(max_children) = env_number(&env, "BOMSIM_MAX_CHILDREN") {
            config.max_children = Some(max_children);
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "bomsim")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.trials.is_some() {
            self.trials = other.trials;
        }
        if other.seed.is_some() {
            self.seed = other.seed;
        }
        if other.max_children.is_some() {
            self.max_children = other.max_children;
        }
        if other.max_depth.is_some() {
            self.max_depth = other.max_depth;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.manual_model.is_some() {
            self.manual_model = other.manual_model;
        }
        if other.software_model.is_some() {
            self.software_model = other.software_model;
        }
    }

    pub fn trials(&self) -> usize {
        self.trials.unwrap_or(Self::DEFAULT_TRIALS)
    }

    pub fn tree_limits(&self) -> TreeLimits {
        let defaults = TreeLimits::default();
        TreeLimits {
            max_children: self.max_children.unwrap_or(defaults.max_children),
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
        }
    }

    pub fn manual_model(&self) -> QuoteModel {
        self.manual_model.clone().unwrap_or_else(QuoteModel::manual)
    }

    pub fn software_model(&self) -> QuoteModel {
        self.software_model
            .clone()
            .unwrap_or_else(QuoteModel::software_assisted)
    }

    /// Every value after defaults are applied, for display
    pub fn resolved(&self) -> Config {
        let limits = self.tree_limits();
        Config {
            trials: Some(self.trials()),
            seed: self.seed,
            max_children: Some(limits.max_children),
            max_depth: Some(limits.max_depth),
            default_format: Some(
                self.default_format
                    .clone()
                    .unwrap_or_else(|| "auto".to_string()),
            ),
            manual_model: Some(self.manual_model()),
            software_model: Some(self.software_model()),
        }
    }
}

fn env_number<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring non-numeric environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from(None, None, no_env);
        assert_eq!(config.trials(), 50);
        assert_eq!(config.tree_limits(), TreeLimits::default());
        assert_eq!(config.manual_model(), QuoteModel::manual());
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_project_overrides_global() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.yaml");
        let project = dir.path().join("bomsim.yaml");
        fs::write(&global, "trials: 10\nmax_children: 5\nseed: 1\n").unwrap();
        fs::write(&project, "trials: 20\n").unwrap();

        let config = Config::load_from(Some(global.as_path()), Some(project.as_path()), no_env);
        assert_eq!(config.trials(), 20);
        assert_eq!(config.tree_limits().max_children, 5);
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("bomsim.yaml");
        fs::write(&project, "trials: 20\nseed: 3\n").unwrap();

        let env = |key: &str| match key {
            "BOMSIM_TRIALS" => Some("7".to_string()),
            "BOMSIM_SEED" => Some("not-a-number".to_string()),
            _ => None,
        };
        let config = Config::load_from(None, Some(project.as_path()), env);
        assert_eq!(config.trials(), 7);
        // bad value ignored, file value kept
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_invalid_file_is_ignored() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("bomsim.yaml");
        fs::write(&project, "trials: [oops\n").unwrap();
        let config = Config::load_from(None, Some(project.as_path()), no_env);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_model_override_from_file() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("bomsim.yaml");
        let mut model = QuoteModel::software_assisted();
        model.name = "tuned".into();
        model.errors.max_rework_per_step = 3;
        let yaml = serde_yml::to_string(&Config {
            software_model: Some(model.clone()),
            ..Config::default()
        })
        .unwrap();
        fs::write(&project, yaml).unwrap();

        let config = Config::load_from(None, Some(project.as_path()), no_env);
        assert_eq!(config.software_model(), model);
        assert_eq!(config.manual_model(), QuoteModel::manual());
    }

    #[test]
    fn test_resolved_fills_everything() {
        let resolved = Config::default().resolved();
        assert_eq!(resolved.trials, Some(50));
        assert_eq!(resolved.max_depth, Some(256));
        assert_eq!(resolved.default_format.as_deref(), Some("auto"));
        assert!(resolved.software_model.is_some());
    }
}
