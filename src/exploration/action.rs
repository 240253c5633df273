//! Action type produced by the exploration model

use crate::common::{Action, Path2D, PlannerResult, Point2D};
use crate::exploration::frontier::FrontierClusterAction;
use crate::exploration::random_walk::RandomWalkAction;
use crate::exploration::state::ExplorationState;

#[derive(Debug, Clone, PartialEq)]
pub enum ExplorationAction {
    RandomWalk(RandomWalkAction),
    FrontierCluster(FrontierClusterAction),
}

impl ExplorationAction {
    /// Straight-line motion from `state`, sampled for collision checking.
    pub fn path(&self, state: &ExplorationState, resolution: f64) -> Path2D {
        Path2D::straight_line(state.position(), self.end_point(state), resolution)
    }

    pub fn end_point(&self, state: &ExplorationState) -> Point2D {
        self.perform(state).position()
    }
}

impl From<RandomWalkAction> for ExplorationAction {
    fn from(action: RandomWalkAction) -> Self {
        ExplorationAction::RandomWalk(action)
    }
}

impl From<FrontierClusterAction> for ExplorationAction {
    fn from(action: FrontierClusterAction) -> Self {
        ExplorationAction::FrontierCluster(action)
    }
}

impl Action for ExplorationAction {
    type State = ExplorationState;

    fn is_feasible(&self, state: &ExplorationState) -> bool {
        match self {
            ExplorationAction::RandomWalk(a) => a.is_feasible(state),
            ExplorationAction::FrontierCluster(a) => a.is_feasible(state),
        }
    }

    fn perform(&self, state: &ExplorationState) -> ExplorationState {
        match self {
            ExplorationAction::RandomWalk(a) => a.perform(state),
            ExplorationAction::FrontierCluster(a) => a.perform(state),
        }
    }

    fn simulate(&mut self, state: &ExplorationState) -> ExplorationState {
        match self {
            ExplorationAction::RandomWalk(a) => a.simulate(state),
            ExplorationAction::FrontierCluster(a) => a.simulate(state),
        }
    }

    fn cost(&self, state: &ExplorationState) -> PlannerResult<f64> {
        match self {
            ExplorationAction::RandomWalk(a) => a.cost(state),
            ExplorationAction::FrontierCluster(a) => a.cost(state),
        }
    }

    fn final_state(&self) -> PlannerResult<&ExplorationState> {
        match self {
            ExplorationAction::RandomWalk(a) => a.final_state(),
            ExplorationAction::FrontierCluster(a) => a.final_state(),
        }
    }
}
