//! Configuration types for the simulation.

use crate::{Error, IndividualRecord, Result, RunId};
use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::path::Path;
use tracing::info;

/// Environment variable naming a JSON config file for the runner
pub const CONFIG_ENV_VAR: &str = "POPSIM_CONFIG";

/// Parameters of the distributions bound to each life event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Poisson rate for the minimum partnering age
    pub capable_engaging_lambda: u32,
    /// Normal mean for the pregnancy-eligibility age
    pub get_pregnant_mean: f64,
    /// Normal standard deviation for the pregnancy-eligibility age
    pub get_pregnant_std_dev: f64,
    /// Normal mean for birth capacity
    pub children_count_mean: f64,
    /// Normal standard deviation for birth capacity
    pub children_count_std_dev: f64,
    /// Exponential rate for inter-birth scheduling
    pub time_children_lambda: f64,
    /// Poisson rate for lifetime
    pub die_lambda: u32,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            capable_engaging_lambda: 18,
            get_pregnant_mean: 28.0,
            get_pregnant_std_dev: 8.0,
            children_count_mean: 2.0,
            children_count_std_dev: 6.0,
            time_children_lambda: 8.0,
            die_lambda: 70,
        }
    }
}

/// Simulation run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Clock ticks to run for (one tick per individual visited)
    pub duration: u64,
    /// Random seed for reproducibility; drawn from entropy when unset
    pub seed: Option<u64>,
    /// Overwrite lifetime, relation age and fertility traits of the initial
    /// population with fresh samples
    pub resample_initial_traits: bool,
    /// Passes between periodic summary logs
    pub summary_interval: u64,
    pub distributions: DistributionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: 1000,
            seed: None,
            resample_initial_traits: false,
            summary_interval: 10,
            distributions: DistributionConfig::default(),
        }
    }
}

/// Runner process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Database path (SQLite)
    pub database_path: String,
    /// Print every survivor after the run
    pub print_survivors: bool,
    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
    /// Start from the survivors of a saved run instead of the seed population
    pub start_from_run: Option<RunId>,
    /// Inserted into the seed population when the database holds none
    pub initial_population: Vec<IndividualRecord>,
    pub simulation: SimulationConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            database_path: "./data/popsim.db".to_string(),
            print_survivors: true,
            json_logs: false,
            start_from_run: None,
            initial_population: Vec::new(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load from the file named by `POPSIM_CONFIG`, or fall back to defaults.
    pub fn load() -> Result<Self> {
        Self::from_env_value(std::env::var(CONFIG_ENV_VAR))
    }

    fn from_env_value(value: std::result::Result<String, VarError>) -> Result<Self> {
        match value {
            Ok(path) => Self::from_file(path),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(raw)) => Err(Error::Validation(format!(
                "{} is not valid UTF-8: {:?}",
                CONFIG_ENV_VAR, raw
            ))),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
