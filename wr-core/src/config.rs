//! On-disk configuration (YAML) for the planner and drivers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::observe::ObserveParams;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Planner tuning knobs.
    #[serde(default)]
    pub planner: PlannerConfig,
    /// Round-trip jump catalog, in priority order.
    #[serde(default = "Catalog::standard")]
    pub catalog: Catalog,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            catalog: Catalog::standard(),
        }
    }
}

/// Planner tuning knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Visual bucket thresholds.
    #[serde(flatten)]
    pub observe: ObserveParams,
    /// UCB1 exploration constant.
    #[serde(default = "default_ucb_constant")]
    pub ucb_constant: f64,
    /// Maximum round trips per simulated playout.
    #[serde(default = "default_max_depth")]
    pub max_depth: u16,
    /// Per-trip decay applied to the success score; < 1 prefers faster
    /// collapses among equally safe lines.
    #[serde(default = "default_trip_decay")]
    pub trip_decay: f64,
    /// When set, prune actions too light to matter (see
    /// `max_reasonable_trips`). Off by default.
    #[serde(default)]
    pub strict_action_filter: bool,
    /// Efficiency floor divisor for the strict filter: an action is
    /// "efficient" when its round trip is at least remaining.max divided by
    /// this.
    #[serde(default = "default_max_reasonable_trips")]
    pub max_reasonable_trips: u16,
}

fn default_ucb_constant() -> f64 {
    std::f64::consts::SQRT_2
}

fn default_max_depth() -> u16 {
    20
}

fn default_trip_decay() -> f64 {
    0.95
}

fn default_max_reasonable_trips() -> u16 {
    9
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            observe: ObserveParams::default(),
            ucb_constant: default_ucb_constant(),
            max_depth: default_max_depth(),
            trip_decay: default_trip_decay(),
            strict_action_filter: false,
            max_reasonable_trips: default_max_reasonable_trips(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
