//! Random-walk action
//!
//! Moves the robot a fixed displacement along an absolute heading. The
//! heading is sampled once when the action is created, so repeated
//! simulation from the same state always lands on the same pose.

use crate::common::{Action, PlannerError, PlannerResult};
use crate::exploration::state::ExplorationState;

#[derive(Debug, Clone, PartialEq)]
pub struct RandomWalkAction {
    angle: f64,
    displacement: f64,
    final_state: Option<ExplorationState>,
}

impl RandomWalkAction {
    /// `angle` is the absolute travel direction [rad], `displacement` the
    /// step length [m].
    pub fn new(angle: f64, displacement: f64) -> Self {
        Self {
            angle,
            displacement,
            final_state: None,
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn displacement(&self) -> f64 {
        self.displacement
    }
}

/// Travel time at top speed; fails on a non-positive speed limit instead of
/// returning an infinite cost.
pub(crate) fn travel_time(distance: f64, state: &ExplorationState) -> PlannerResult<f64> {
    let max_speed = state.max_speed();
    if !(max_speed > 0.0) || !max_speed.is_finite() {
        return Err(PlannerError::Domain(format!(
            "max_speed must be positive and finite, got {}",
            max_speed
        )));
    }
    Ok(distance / max_speed)
}

impl Action for RandomWalkAction {
    type State = ExplorationState;

    fn is_feasible(&self, state: &ExplorationState) -> bool {
        state.max_speed() > 0.0
            && self.displacement >= 0.0
            && self.displacement.is_finite()
            && self.angle.is_finite()
    }

    fn perform(&self, state: &ExplorationState) -> ExplorationState {
        // Omnidirectional robot: heading and speed limit carry over
        let end_pose = state.pose().translated(self.displacement, self.angle);
        ExplorationState::new(end_pose, state.max_speed())
    }

    fn simulate(&mut self, state: &ExplorationState) -> ExplorationState {
        let end = self.perform(state);
        self.final_state = Some(end);
        end
    }

    fn cost(&self, state: &ExplorationState) -> PlannerResult<f64> {
        travel_time(self.displacement, state)
    }

    fn final_state(&self) -> PlannerResult<&ExplorationState> {
        self.final_state.as_ref().ok_or_else(|| {
            PlannerError::StateError("random walk has not been simulated yet".to_string())
        })
    }
}
