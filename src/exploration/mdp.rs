//! Exploration decision model
//!
//! Two action families are offered from every state:
//! - random walks: `random_displacement_factor` headings sampled uniformly
//!   around the current heading, each a fixed-length step
//! - frontier clusters: a straight drive to each of the
//!   `frontier_branching_factor` nearest frontier centroids
//!
//! Candidates are generated first and filtered into a new set afterwards;
//! any candidate rejected by the action's precondition or by the
//! feasibility oracle is silently dropped.

use itertools::Itertools;
use ordered_float::NotNan;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::trace;

use crate::common::{
    ensure_finite, Action, ActionId, ActionSet, DecisionProcess, FeasibilityOracle, PlannerError,
    PlannerResult, Point2D, RewardModel,
};
use crate::config::ExplorationConfig;
use crate::exploration::action::ExplorationAction;
use crate::exploration::frontier::FrontierClusterAction;
use crate::exploration::random_walk::RandomWalkAction;
use crate::exploration::reward::TravelCostPenalty;
use crate::exploration::state::ExplorationState;

#[derive(Debug, Clone)]
pub struct Exploration<O, W = TravelCostPenalty> {
    config: ExplorationConfig,
    oracle: O,
    reward: W,
    frontiers: Vec<Point2D>,
}

impl<O> Exploration<O, TravelCostPenalty>
where
    O: FeasibilityOracle<ExplorationState>,
{
    pub fn new(config: ExplorationConfig, oracle: O) -> PlannerResult<Self> {
        Self::with_reward(config, oracle, TravelCostPenalty::default())
    }
}

impl<O, W> Exploration<O, W>
where
    O: FeasibilityOracle<ExplorationState>,
    W: RewardModel<ExplorationState, ExplorationAction>,
{
    pub fn with_reward(config: ExplorationConfig, oracle: O, reward: W) -> PlannerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            oracle,
            reward,
            frontiers: Vec::new(),
        })
    }

    /// Replace the frontier cluster centroids supplied by the mapping layer.
    pub fn with_frontiers(mut self, frontiers: Vec<Point2D>) -> Self {
        self.frontiers = frontiers;
        self
    }

    pub fn set_frontiers(&mut self, frontiers: Vec<Point2D>) {
        self.frontiers = frontiers;
    }

    pub fn frontiers(&self) -> &[Point2D] {
        &self.frontiers
    }

    pub fn config(&self) -> &ExplorationConfig {
        &self.config
    }

    /// Heading offsets relative to the current heading.
    pub fn sample_displacement_angles<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let n = self.config.random_displacement_factor;
        let half = self.config.half_spread();
        if half <= 0.0 {
            return vec![0.0; n];
        }
        let uniform = Uniform::new_inclusive(-half, half);
        (0..n).map(|_| uniform.sample(rng)).collect()
    }

    fn sample_random_walks<R: Rng + ?Sized>(
        &self,
        state: &ExplorationState,
        rng: &mut R,
    ) -> Vec<ExplorationAction> {
        let offset_angle = state.heading();
        self.sample_displacement_angles(rng)
            .into_iter()
            .map(|sampled| {
                RandomWalkAction::new(offset_angle + sampled, self.config.random_displacement_length)
                    .into()
            })
            .collect()
    }

    /// Nearest frontier centroids first; equal distances keep supply order.
    fn nearest_frontiers(&self, state: &ExplorationState) -> PlannerResult<Vec<ExplorationAction>> {
        let here = state.position();
        let keyed = self
            .frontiers
            .iter()
            .map(|f| {
                NotNan::new(here.distance(f))
                    .map(|d| (d, *f))
                    .map_err(|_| PlannerError::Numerical(format!("frontier distance is NaN for {:?}", f)))
            })
            .collect::<PlannerResult<Vec<_>>>()?;

        Ok(keyed
            .into_iter()
            .filter(|(d, _)| d.into_inner() > 0.0)
            .sorted_by_key(|(d, _)| *d)
            .take(self.config.frontier_branching_factor)
            .map(|(_, f)| FrontierClusterAction::new(f).into())
            .collect())
    }
}

impl<O, W> DecisionProcess for Exploration<O, W>
where
    O: FeasibilityOracle<ExplorationState>,
    W: RewardModel<ExplorationState, ExplorationAction>,
{
    type State = ExplorationState;
    type Action = ExplorationAction;

    fn potential_feasible_actions<R: Rng + ?Sized>(
        &self,
        state: &ExplorationState,
        rng: &mut R,
    ) -> PlannerResult<ActionSet<ExplorationAction>> {
        let mut candidates = self.sample_random_walks(state, rng);
        candidates.extend(self.nearest_frontiers(state)?);
        let sampled = candidates.len();

        let mut feasible = ActionSet::new();
        for (index, action) in candidates.into_iter().enumerate() {
            if self.is_feasible(state, &action)? {
                feasible.insert(ActionId(index as u32), action);
            }
        }

        trace!(sampled, feasible = feasible.len(), "generated candidate actions");
        Ok(feasible)
    }

    fn reward(&self, state: &ExplorationState, action: &ExplorationAction) -> PlannerResult<f64> {
        ensure_finite(self.reward.reward(state, action)?, "reward")
    }

    fn is_feasible(&self, state: &ExplorationState, action: &ExplorationAction) -> PlannerResult<bool> {
        if !action.is_feasible(state) {
            return Ok(false);
        }
        let path = action.path(state, self.config.path_resolution);
        self.oracle.check(state, &path)
    }
}
