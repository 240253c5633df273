//! Common traits defining the planner's decision-model contracts

use std::collections::BTreeMap;
use std::fmt::Debug;

use rand::Rng;

use crate::common::error::PlannerResult;
use crate::common::types::{ActionId, Path2D};

/// Candidate actions keyed by their identifier. Iteration follows
/// generation order, which keeps expansion deterministic.
pub type ActionSet<A> = BTreeMap<ActionId, A>;

/// Snapshot of the robot configuration at one point in time.
///
/// States are plain values: every transformation produces a new one.
pub trait State: Clone + Debug + Send + Sync {}

/// A parameterized transformation of a state into a successor state.
pub trait Action: Clone + Debug + Send + Sync {
    type State: State;

    /// Local precondition check. Must not mutate anything.
    fn is_feasible(&self, state: &Self::State) -> bool;

    /// Apply the action to `state` without recording the result.
    fn perform(&self, state: &Self::State) -> Self::State;

    /// Apply the action to `state` and cache the result as the final state.
    fn simulate(&mut self, state: &Self::State) -> Self::State;

    /// Non-negative cost of executing the action from `state`.
    fn cost(&self, state: &Self::State) -> PlannerResult<f64>;

    /// Result of the most recent [`Action::simulate`] call.
    fn final_state(&self) -> PlannerResult<&Self::State>;
}

/// The decision model (MDP) the search runs against.
pub trait DecisionProcess: Send + Sync {
    type State: State;
    type Action: Action<State = Self::State>;

    /// Every action currently feasible from `state`. An empty set marks a
    /// terminal state.
    fn potential_feasible_actions<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        rng: &mut R,
    ) -> PlannerResult<ActionSet<Self::Action>>;

    fn simulate(&self, state: &Self::State, action: &mut Self::Action) -> PlannerResult<Self::State> {
        Ok(action.simulate(state))
    }

    /// Finite scalar reward of taking `action` from `state`.
    fn reward(&self, state: &Self::State, action: &Self::Action) -> PlannerResult<f64>;

    /// Action precondition plus any global constraint the model adds.
    fn is_feasible(&self, state: &Self::State, action: &Self::Action) -> PlannerResult<bool> {
        Ok(action.is_feasible(state))
    }
}

/// External collision / obstacle check for a proposed motion.
///
/// `Err` means the oracle itself is unavailable, not that the path is blocked.
pub trait FeasibilityOracle<S>: Send + Sync {
    fn check(&self, start: &S, path: &Path2D) -> PlannerResult<bool>;
}

impl<S, F> FeasibilityOracle<S> for F
where
    F: Fn(&S, &Path2D) -> PlannerResult<bool> + Send + Sync,
{
    fn check(&self, start: &S, path: &Path2D) -> PlannerResult<bool> {
        self(start, path)
    }
}

/// Domain-specific reward source.
pub trait RewardModel<S, A>: Send + Sync {
    fn reward(&self, state: &S, action: &A) -> PlannerResult<f64>;
}

impl<S, A, F> RewardModel<S, A> for F
where
    F: Fn(&S, &A) -> PlannerResult<f64> + Send + Sync,
{
    fn reward(&self, state: &S, action: &A) -> PlannerResult<f64> {
        self(state, action)
    }
}
