//! Configuration loading for Marga

use crate::error::{MargaError, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MargaConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub grid: GridConfig,
}

/// Controller settings
#[derive(Clone, Debug, Deserialize)]
pub struct ControllerConfig {
    /// Label used in log lines for the registered caller
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Retries granted when the caller does not pass a budget (default: 0)
    #[serde(default)]
    pub default_retry_budget: u32,
}

/// Defaults for a freshly created search context
#[derive(Clone, Debug, Deserialize)]
pub struct ContextConfig {
    /// Highest fruit density (percent) a path may cross (default: 0)
    #[serde(default)]
    pub max_fruit_percent: f32,

    /// Cost multiplier for cells outside the field (default: 7.5)
    #[serde(default = "default_off_field_penalty")]
    pub off_field_penalty: f32,

    /// Allow reverse segments in the result (default: false)
    #[serde(default)]
    pub allow_reverse: bool,

    /// Require the path to end exactly at the goal (default: false)
    #[serde(default)]
    pub must_be_accurate: bool,

    /// Node expansions allowed before giving up (default: 40000)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Treat harvested fruit heaps as free (default: false)
    #[serde(default)]
    pub ignore_fruit_heaps: bool,
}

/// Reference grid engine settings
#[derive(Clone, Debug, Deserialize)]
pub struct GridConfig {
    /// Node expansions per controller tick (default: 200)
    #[serde(default = "default_expansions_per_step")]
    pub expansions_per_step: usize,

    /// Goal tolerance in cells, Chebyshev distance (default: 0)
    #[serde(default)]
    pub goal_tolerance_cells: i32,

    /// 8-connected instead of 4-connected search (default: true)
    #[serde(default = "default_allow_diagonal")]
    pub allow_diagonal: bool,
}

fn default_owner() -> String {
    "vehicle".to_string()
}
fn default_off_field_penalty() -> f32 {
    7.5
}
fn default_max_iterations() -> usize {
    40_000
}
fn default_expansions_per_step() -> usize {
    200
}
fn default_allow_diagonal() -> bool {
    true
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            default_retry_budget: 0,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_fruit_percent: 0.0,
            off_field_penalty: default_off_field_penalty(),
            allow_reverse: false,
            must_be_accurate: false,
            max_iterations: default_max_iterations(),
            ignore_fruit_heaps: false,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            expansions_per_step: default_expansions_per_step(),
            goal_tolerance_cells: 0,
            allow_diagonal: default_allow_diagonal(),
        }
    }
}

impl MargaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MargaError::Config(format!("Failed to read config file: {}", e)))?;
        let config: MargaConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
