//! Planner configuration.
//!
//! All tuning constants are fixed for a planning session. Values can be
//! built in code (`Default` + `with_*`) or read from a TOML document where
//! missing keys fall back to the defaults:
//!
//! ```toml
//! [exploration]
//! random_displacement_factor = 8
//! random_displacement_length = 1.0
//! random_spread_angle = 3.14159
//!
//! [search]
//! iterations = 500
//! seed = 7
//! final_selection = "max_mean"
//! ```

use std::f64::consts::PI;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::{PlannerError, PlannerResult};

/// Candidate-generation parameters of the exploration model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Number of random-walk headings sampled per state
    pub random_displacement_factor: usize,
    /// Maximum number of frontier-cluster actions per state
    pub frontier_branching_factor: usize,
    /// Random-walk step length [m]
    pub random_displacement_length: f64,
    /// Hard cap on the absolute heading offset [rad]
    pub random_max_angle: f64,
    /// Width of the sampled heading-offset window [rad]
    pub random_spread_angle: f64,
    /// Path sampling step handed to the feasibility oracle [m]
    pub path_resolution: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            random_displacement_factor: 8,
            frontier_branching_factor: 3,
            random_displacement_length: 1.0,
            random_max_angle: PI,
            random_spread_angle: PI,
            path_resolution: 0.1,
        }
    }
}

impl ExplorationConfig {
    pub fn with_sampling(mut self, samples: usize, displacement: f64, spread_angle: f64) -> Self {
        self.random_displacement_factor = samples;
        self.random_displacement_length = displacement;
        self.random_spread_angle = spread_angle;
        self
    }

    pub fn with_frontier_branching(mut self, branching: usize) -> Self {
        self.frontier_branching_factor = branching;
        self
    }

    /// Half-width of the heading-offset sampling window.
    pub fn half_spread(&self) -> f64 {
        (self.random_spread_angle / 2.0).min(self.random_max_angle)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if !(self.random_displacement_length >= 0.0) || !self.random_displacement_length.is_finite() {
            return Err(PlannerError::InvalidParameter(format!(
                "random_displacement_length must be finite and >= 0, got {}",
                self.random_displacement_length
            )));
        }
        if !(self.random_spread_angle >= 0.0) || self.random_spread_angle > 2.0 * PI {
            return Err(PlannerError::InvalidParameter(format!(
                "random_spread_angle must lie in [0, 2pi], got {}",
                self.random_spread_angle
            )));
        }
        if !(self.random_max_angle >= 0.0) || !self.random_max_angle.is_finite() {
            return Err(PlannerError::InvalidParameter(format!(
                "random_max_angle must be finite and >= 0, got {}",
                self.random_max_angle
            )));
        }
        if !(self.path_resolution > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "path_resolution must be > 0, got {}",
                self.path_resolution
            )));
        }
        Ok(())
    }
}

/// How the final recommendation is picked among the root's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSelection {
    /// Most visited child
    RobustChild,
    /// Highest mean return
    MaxMean,
}

/// Search loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum iterations per planning call
    pub iterations: usize,
    /// Optional wall-clock budget per planning call [ms]
    pub time_budget_ms: Option<u64>,
    /// Maximum number of rollout steps
    pub rollout_depth: usize,
    /// Optional cap on the summed action cost of one rollout
    pub rollout_cost_budget: Option<f64>,
    /// Reward discount per step
    pub discount: f64,
    /// UCT exploration constant
    pub exploration_constant: f64,
    pub final_selection: FinalSelection,
    /// Rollouts run per expansion (> 1 runs them on the rayon pool)
    pub leaf_rollouts: usize,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            time_budget_ms: None,
            rollout_depth: 10,
            rollout_cost_budget: None,
            discount: 0.95,
            exploration_constant: std::f64::consts::SQRT_2,
            final_selection: FinalSelection::RobustChild,
            leaf_rollouts: 1,
            seed: 0,
        }
    }
}

impl SearchConfig {
    /// Small budget for unit tests.
    pub fn for_testing() -> Self {
        Self {
            iterations: 50,
            rollout_depth: 3,
            ..Default::default()
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = Some(budget.as_millis() as u64);
        self
    }

    pub fn with_final_selection(mut self, selection: FinalSelection) -> Self {
        self.final_selection = selection;
        self
    }

    pub fn with_leaf_rollouts(mut self, rollouts: usize) -> Self {
        self.leaf_rollouts = rollouts;
        self
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if self.iterations == 0 {
            return Err(PlannerError::InvalidParameter("iterations must be >= 1".to_string()));
        }
        if self.leaf_rollouts == 0 {
            return Err(PlannerError::InvalidParameter("leaf_rollouts must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(PlannerError::InvalidParameter(format!(
                "discount must lie in [0, 1], got {}",
                self.discount
            )));
        }
        if !(self.exploration_constant >= 0.0) || !self.exploration_constant.is_finite() {
            return Err(PlannerError::InvalidParameter(format!(
                "exploration_constant must be finite and >= 0, got {}",
                self.exploration_constant
            )));
        }
        if let Some(budget) = self.rollout_cost_budget {
            if !(budget >= 0.0) {
                return Err(PlannerError::InvalidParameter(format!(
                    "rollout_cost_budget must be >= 0, got {}",
                    budget
                )));
            }
        }
        Ok(())
    }
}

/// Full configuration of one planning session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub exploration: ExplorationConfig,
    pub search: SearchConfig,
}

impl PlannerConfig {
    pub fn from_toml_str(text: &str) -> PlannerResult<Self> {
        let config: PlannerConfig =
            toml::from_str(text).map_err(|e| PlannerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        self.exploration.validate()?;
        self.search.validate()
    }
}
