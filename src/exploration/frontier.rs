//! Frontier-cluster action: drive straight to a frontier cluster centroid.

use crate::common::{Action, PlannerError, PlannerResult, Point2D, Pose2D};
use crate::exploration::random_walk::travel_time;
use crate::exploration::state::ExplorationState;

#[derive(Debug, Clone, PartialEq)]
pub struct FrontierClusterAction {
    target: Point2D,
    final_state: Option<ExplorationState>,
}

impl FrontierClusterAction {
    pub fn new(target: Point2D) -> Self {
        Self {
            target,
            final_state: None,
        }
    }

    pub fn target(&self) -> Point2D {
        self.target
    }
}

impl Action for FrontierClusterAction {
    type State = ExplorationState;

    fn is_feasible(&self, state: &ExplorationState) -> bool {
        state.max_speed() > 0.0
            && self.target.x.is_finite()
            && self.target.y.is_finite()
            && state.position() != self.target
    }

    /// Ends on the centroid, facing along the travel direction.
    fn perform(&self, state: &ExplorationState) -> ExplorationState {
        let from = state.position();
        let yaw = (self.target.y - from.y).atan2(self.target.x - from.x);
        ExplorationState::new(Pose2D::new(self.target.x, self.target.y, yaw), state.max_speed())
    }

    fn simulate(&mut self, state: &ExplorationState) -> ExplorationState {
        let end = self.perform(state);
        self.final_state = Some(end);
        end
    }

    fn cost(&self, state: &ExplorationState) -> PlannerResult<f64> {
        travel_time(state.position().distance(&self.target), state)
    }

    fn final_state(&self) -> PlannerResult<&ExplorationState> {
        self.final_state.as_ref().ok_or_else(|| {
            PlannerError::StateError("frontier action has not been simulated yet".to_string())
        })
    }
}
