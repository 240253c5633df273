//! Reward models for exploration actions

use crate::common::{Action, PlannerResult, RewardModel};
use crate::exploration::action::ExplorationAction;
use crate::exploration::state::ExplorationState;

/// Penalises travel time: `reward = -weight * cost`.
#[derive(Debug, Clone, Copy)]
pub struct TravelCostPenalty {
    pub weight: f64,
}

impl TravelCostPenalty {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

impl Default for TravelCostPenalty {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

impl RewardModel<ExplorationState, ExplorationAction> for TravelCostPenalty {
    fn reward(&self, state: &ExplorationState, action: &ExplorationAction) -> PlannerResult<f64> {
        Ok(-self.weight * action.cost(state)?)
    }
}
