//! Root parallelization.
//!
//! The root candidate set is sampled once, then several independent trees
//! are searched from it on the rayon pool, each with its own seed. Trees
//! share no mutable state; their first-level visit counts are summed per
//! action id and the most visited action wins.

use std::collections::BTreeMap;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::common::{ActionId, DecisionProcess, PlannerError, PlannerResult};
use crate::config::SearchConfig;
use crate::mcts::rollout::RolloutPolicy;
use crate::mcts::search::{PlanOutcome, Recommendation, SearchStats, TreeSearch};
use crate::mcts::tree::ChildStats;
use crate::mcts::value::ValueFunction;

#[derive(Debug, Default, Clone, Copy)]
struct Merged {
    visits: u32,
    value_sum: f64,
}

/// Search `workers` independent trees from `state` and merge their root
/// statistics. Worker `i` is seeded with `config.seed + 1 + i`.
pub fn plan_root_parallel<M, V, P>(
    mdp: &M,
    value_fn: &V,
    policy: &P,
    config: &SearchConfig,
    state: M::State,
    workers: usize,
) -> PlannerResult<PlanOutcome<M::State, M::Action>>
where
    M: DecisionProcess + Clone,
    V: ValueFunction + Clone,
    P: RolloutPolicy<M> + Clone,
{
    if workers == 0 {
        return Err(PlannerError::InvalidParameter("workers must be >= 1".to_string()));
    }
    config.validate()?;
    let started = Instant::now();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let root_actions = mdp.potential_feasible_actions(&state, &mut rng)?;
    if root_actions.is_empty() {
        return Ok(PlanOutcome::NoFeasibleAction {
            stats: SearchStats {
                node_count: 1,
                elapsed: started.elapsed(),
                ..Default::default()
            },
        });
    }

    let outcomes = (0..workers)
        .into_par_iter()
        .map(|worker| {
            let worker_config = config.clone().with_seed(config.seed.wrapping_add(1 + worker as u64));
            let mut search =
                TreeSearch::with_strategies(mdp.clone(), value_fn.clone(), policy.clone(), worker_config)?;
            search.plan_with_root_actions(state.clone(), root_actions.clone())
        })
        .collect::<PlannerResult<Vec<_>>>()?;

    let mut merged: BTreeMap<ActionId, Merged> = BTreeMap::new();
    let mut stats = SearchStats::default();
    for outcome in &outcomes {
        let worker_stats = outcome.stats();
        stats.iterations += worker_stats.iterations;
        stats.cancelled |= worker_stats.cancelled;
        stats.node_count += worker_stats.node_count;
        stats.max_depth = stats.max_depth.max(worker_stats.max_depth);
        stats.root_visits += worker_stats.root_visits;

        if let Some(rec) = outcome.recommendation() {
            for child in &rec.children {
                let entry = merged.entry(child.action_id).or_default();
                entry.visits += child.visits;
                entry.value_sum += child.mean_value * child.visits as f64;
            }
        }
    }
    stats.elapsed = started.elapsed();

    let children: Vec<ChildStats> = merged
        .iter()
        .map(|(&action_id, m)| ChildStats {
            action_id,
            visits: m.visits,
            mean_value: if m.visits == 0 { 0.0 } else { m.value_sum / m.visits as f64 },
        })
        .collect();

    // Most visits wins; the lowest action id wins ties
    let best = children
        .iter()
        .copied()
        .fold(None, |best: Option<ChildStats>, c| match best {
            Some(b) if b.visits >= c.visits => Some(b),
            _ => Some(c),
        });

    let Some(best) = best else {
        return Ok(PlanOutcome::NoFeasibleAction { stats });
    };
    let Some(mut action) = root_actions.get(&best.action_id).cloned() else {
        return Err(PlannerError::StateError(format!(
            "merged action {} is not a root candidate",
            best.action_id
        )));
    };
    let end_state = mdp.simulate(&state, &mut action)?;

    debug!(
        workers,
        action = %best.action_id,
        visits = best.visits,
        iterations = stats.iterations,
        "merged root-parallel search"
    );

    Ok(PlanOutcome::Recommended(Recommendation {
        action_id: best.action_id,
        action,
        state: end_state,
        visits: best.visits,
        mean_value: best.mean_value,
        children,
        stats,
    }))
}
