//! Default-policy rollouts used to estimate a freshly expanded node.

use rand::Rng;

use crate::common::{ensure_finite, Action, ActionSet, DecisionProcess, PlannerError, PlannerResult};
use crate::config::SearchConfig;

/// Picks the next action during a rollout.
pub trait RolloutPolicy<M: DecisionProcess>: Send + Sync {
    fn choose<R: Rng + ?Sized>(
        &self,
        state: &M::State,
        candidates: ActionSet<M::Action>,
        rng: &mut R,
    ) -> Option<M::Action>;
}

/// Uniform choice among the feasible candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRollout;

impl<M: DecisionProcess> RolloutPolicy<M> for UniformRollout {
    fn choose<R: Rng + ?Sized>(
        &self,
        _state: &M::State,
        candidates: ActionSet<M::Action>,
        rng: &mut R,
    ) -> Option<M::Action> {
        if candidates.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..candidates.len());
        candidates.into_values().nth(index)
    }
}

/// Limits of a single rollout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolloutBudget {
    pub depth: usize,
    pub cost: Option<f64>,
    pub discount: f64,
}

impl From<&SearchConfig> for RolloutBudget {
    fn from(config: &SearchConfig) -> Self {
        Self {
            depth: config.rollout_depth,
            cost: config.rollout_cost_budget,
            discount: config.discount,
        }
    }
}

/// Simulate forward from `start` and return the discounted reward sum.
///
/// Stops at the depth limit, when the next action would exceed the cost
/// budget, or when no feasible action remains.
pub fn rollout<M, P, R>(
    mdp: &M,
    policy: &P,
    start: &M::State,
    budget: &RolloutBudget,
    rng: &mut R,
) -> PlannerResult<f64>
where
    M: DecisionProcess,
    P: RolloutPolicy<M>,
    R: Rng + ?Sized,
{
    let mut state = start.clone();
    let mut total = 0.0;
    let mut spent = 0.0;
    let mut weight = 1.0;

    for _ in 0..budget.depth {
        let candidates = mdp.potential_feasible_actions(&state, rng)?;
        let Some(mut action) = policy.choose(&state, candidates, rng) else {
            break;
        };

        let cost = ensure_finite(action.cost(&state)?, "action cost")?;
        if cost < 0.0 {
            return Err(PlannerError::Domain(format!("action cost is negative: {}", cost)));
        }
        if let Some(limit) = budget.cost {
            if spent + cost > limit {
                break;
            }
        }

        total += weight * mdp.reward(&state, &action)?;
        weight *= budget.discount;
        spent += cost;
        state = mdp.simulate(&state, &mut action)?;
    }

    Ok(total)
}
