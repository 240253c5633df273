//! Tree search engine.
//!
//! Each iteration runs to completion before the next starts:
//! 1. Selection: descend by the value function until a node with untried
//!    actions or a dead end is reached
//! 2. Expansion: simulate the first untried action into a new child
//! 3. Rollout: estimate the child with the default policy
//! 4. Backpropagation: add the return to the child and every ancestor
//!
//! Cancellation and the time budget are only checked between iterations.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::common::{ActionId, ActionSet, DecisionProcess, PlannerError, PlannerResult};
use crate::config::SearchConfig;
use crate::mcts::cancel::CancelToken;
use crate::mcts::node::NodeId;
use crate::mcts::rollout::{rollout, RolloutBudget, RolloutPolicy, UniformRollout};
use crate::mcts::tree::{ChildStats, SearchTree};
use crate::mcts::value::{Uct, ValueFunction};

/// Summary of one planning call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    pub iterations: usize,
    /// Stopped early by the cancel token or the time budget
    pub cancelled: bool,
    pub node_count: usize,
    pub max_depth: usize,
    pub root_visits: u32,
    pub elapsed: Duration,
}

/// The action the search settled on, with its simulated outcome
#[derive(Debug, Clone)]
pub struct Recommendation<S, A> {
    pub action_id: ActionId,
    /// Simulated action; its final state is cached
    pub action: A,
    pub state: S,
    pub visits: u32,
    pub mean_value: f64,
    pub children: Vec<ChildStats>,
    pub stats: SearchStats,
}

#[derive(Debug, Clone)]
pub enum PlanOutcome<S, A> {
    Recommended(Recommendation<S, A>),
    /// The root has no feasible action at all
    NoFeasibleAction { stats: SearchStats },
}

impl<S, A> PlanOutcome<S, A> {
    pub fn recommendation(&self) -> Option<&Recommendation<S, A>> {
        match self {
            PlanOutcome::Recommended(rec) => Some(rec),
            PlanOutcome::NoFeasibleAction { .. } => None,
        }
    }

    pub fn into_recommendation(self) -> Option<Recommendation<S, A>> {
        match self {
            PlanOutcome::Recommended(rec) => Some(rec),
            PlanOutcome::NoFeasibleAction { .. } => None,
        }
    }

    pub fn stats(&self) -> &SearchStats {
        match self {
            PlanOutcome::Recommended(rec) => &rec.stats,
            PlanOutcome::NoFeasibleAction { stats } => stats,
        }
    }

    pub fn is_no_feasible_action(&self) -> bool {
        matches!(self, PlanOutcome::NoFeasibleAction { .. })
    }
}

type Tree<M> = SearchTree<<M as DecisionProcess>::State, <M as DecisionProcess>::Action>;
type Outcome<M> = PlanOutcome<<M as DecisionProcess>::State, <M as DecisionProcess>::Action>;

/// Monte Carlo tree search over a [`DecisionProcess`].
pub struct TreeSearch<M: DecisionProcess, V = Uct, P = UniformRollout> {
    mdp: M,
    value_fn: V,
    policy: P,
    config: SearchConfig,
    rng: ChaCha8Rng,
    tree: Option<Tree<M>>,
    cancel: CancelToken,
}

impl<M: DecisionProcess> TreeSearch<M, Uct, UniformRollout> {
    /// UCT selection with uniform rollouts.
    pub fn new(mdp: M, config: SearchConfig) -> PlannerResult<Self> {
        let uct = Uct::new(config.exploration_constant);
        Self::with_strategies(mdp, uct, UniformRollout, config)
    }
}

impl<M, V, P> TreeSearch<M, V, P>
where
    M: DecisionProcess,
    V: ValueFunction,
    P: RolloutPolicy<M>,
{
    pub fn with_strategies(mdp: M, value_fn: V, policy: P, config: SearchConfig) -> PlannerResult<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            mdp,
            value_fn,
            policy,
            config,
            rng,
            tree: None,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn mdp(&self) -> &M {
        &self.mdp
    }

    pub fn mdp_mut(&mut self) -> &mut M {
        &mut self.mdp
    }

    /// Tree of the most recent planning call.
    pub fn tree(&self) -> Option<&Tree<M>> {
        self.tree.as_ref()
    }

    /// Build a fresh tree rooted at `state` and search it.
    pub fn plan(&mut self, state: M::State) -> PlannerResult<Outcome<M>> {
        let root_actions = self.mdp.potential_feasible_actions(&state, &mut self.rng)?;
        self.plan_with_root_actions(state, root_actions)
    }

    /// Search a fresh tree whose root candidates are given by the caller.
    pub fn plan_with_root_actions(
        &mut self,
        state: M::State,
        root_actions: ActionSet<M::Action>,
    ) -> PlannerResult<Outcome<M>> {
        self.tree = Some(SearchTree::new(state, root_actions));
        self.resume()
    }

    /// Spend another budget on the current tree.
    pub fn resume(&mut self) -> PlannerResult<Outcome<M>> {
        let mut tree = self
            .tree
            .take()
            .ok_or_else(|| PlannerError::StateError("no search tree, call plan first".to_string()))?;
        let result = self.run(&mut tree);
        self.tree = Some(tree);
        result
    }

    /// Move the root to the child reached by `action_id`, dropping every
    /// sibling branch, and return the new root state.
    pub fn commit(&mut self, action_id: ActionId) -> PlannerResult<M::State> {
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| PlannerError::StateError("no search tree, call plan first".to_string()))?;
        let child = tree.child_for_action(tree.root(), action_id).ok_or_else(|| {
            PlannerError::StateError(format!("action {} was never expanded at the root", action_id))
        })?;
        tree.reroot(child)?;
        debug!(action = %action_id, nodes = tree.len(), "committed to action");
        Ok(tree.get(tree.root()).state().clone())
    }

    fn run(&mut self, tree: &mut Tree<M>) -> PlannerResult<Outcome<M>> {
        let started = Instant::now();
        let deadline = self.config.time_budget().map(|budget| started + budget);

        if tree.get(tree.root()).is_terminal() {
            debug!("root has no feasible action");
            return Ok(PlanOutcome::NoFeasibleAction {
                stats: Self::stats(tree, 0, false, started),
            });
        }

        let mut iterations = 0;
        let mut cancelled = false;
        while iterations < self.config.iterations {
            if iterations > 0 && self.should_stop(deadline) {
                cancelled = true;
                warn!(iterations, "search stopped early");
                break;
            }
            self.iterate(tree)?;
            iterations += 1;
        }

        let stats = Self::stats(tree, iterations, cancelled, started);
        debug!(
            iterations = stats.iterations,
            nodes = stats.node_count,
            max_depth = stats.max_depth,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "search finished"
        );
        Ok(self.recommend(tree, stats))
    }

    fn should_stop(&self, deadline: Option<Instant>) -> bool {
        self.cancel.is_cancelled() || deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// One select -> expand -> rollout -> backpropagate pass.
    fn iterate(&mut self, tree: &mut Tree<M>) -> PlannerResult<()> {
        let leaf = self.select(tree)?;

        let (node, returns) = if tree.get(leaf).is_expandable() {
            let child = self.expand(tree, leaf)?;
            let returns = self.estimate(tree, child)?;
            (child, returns)
        } else {
            // Dead end: only the edge reward counts
            (leaf, vec![tree.get(leaf).reward()])
        };

        for value in &returns {
            tree.backpropagate(node, *value);
        }

        trace!(node = node.0, depth = tree.get(node).depth(), rollouts = returns.len(), "iteration complete");
        Ok(())
    }

    fn select(&self, tree: &mut Tree<M>) -> PlannerResult<NodeId> {
        let mdp = &self.mdp;
        let mut current = tree.root();

        loop {
            if tree.get(current).is_expandable() {
                let pruned = tree
                    .get_mut(current)
                    .prune_infeasible(|state, action| mdp.is_feasible(state, action))?;
                if pruned > 0 {
                    trace!(node = current.0, pruned, "dropped infeasible actions");
                }
                if tree.get(current).is_expandable() {
                    return Ok(current);
                }
            }

            match tree.select_child(current, &self.value_fn) {
                Some(child) => current = child,
                None => return Ok(current),
            }
        }
    }

    fn expand(&mut self, tree: &mut Tree<M>, node_id: NodeId) -> PlannerResult<NodeId> {
        let node = tree.get(node_id);
        let (action_id, mut action) = node
            .potential_children()
            .first_key_value()
            .map(|(&id, action)| (id, action.clone()))
            .ok_or_else(|| PlannerError::StateError("expanded a node without untried actions".to_string()))?;

        let parent_state = node.state();
        let reward = self.mdp.reward(parent_state, &action)?;
        let state = self.mdp.simulate(parent_state, &mut action)?;
        let potential = self.mdp.potential_feasible_actions(&state, &mut self.rng)?;

        // The node only changes once every fallible step has succeeded
        match tree.get_mut(node_id).take_untried() {
            Some((taken, _)) if taken == action_id => {}
            _ => {
                return Err(PlannerError::StateError(format!(
                    "untried action {} changed during expansion",
                    action_id
                )))
            }
        }
        Ok(tree.add_child(node_id, action_id, action, state, reward, potential))
    }

    /// Returns of the configured number of rollouts from `node_id`,
    /// including the edge reward into it.
    fn estimate(&mut self, tree: &Tree<M>, node_id: NodeId) -> PlannerResult<Vec<f64>> {
        let node = tree.get(node_id);
        let budget = RolloutBudget::from(&self.config);

        let rollouts = if self.config.leaf_rollouts == 1 {
            vec![rollout(&self.mdp, &self.policy, node.state(), &budget, &mut self.rng)?]
        } else {
            let seeds: Vec<u64> = (0..self.config.leaf_rollouts).map(|_| self.rng.gen()).collect();
            let mdp = &self.mdp;
            let policy = &self.policy;
            let state = node.state();
            seeds
                .into_par_iter()
                .map(|seed| {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    rollout(mdp, policy, state, &budget, &mut rng)
                })
                .collect::<PlannerResult<Vec<f64>>>()?
        };

        let edge = node.reward();
        let discount = self.config.discount;
        Ok(rollouts.into_iter().map(|r| edge + discount * r).collect())
    }

    fn recommend(&self, tree: &Tree<M>, stats: SearchStats) -> Outcome<M> {
        let root = tree.root();
        let best = tree
            .best_child(root, self.config.final_selection)
            .and_then(|id| {
                let node = tree.get(id);
                node.action_id().zip(node.action()).map(|(action_id, action)| (node, action_id, action))
            });

        match best {
            Some((node, action_id, action)) => PlanOutcome::Recommended(Recommendation {
                action_id,
                action: action.clone(),
                state: node.state().clone(),
                visits: node.visits(),
                mean_value: node.mean_value(),
                children: tree.child_stats(root),
                stats,
            }),
            None => PlanOutcome::NoFeasibleAction { stats },
        }
    }

    fn stats(tree: &Tree<M>, iterations: usize, cancelled: bool, started: Instant) -> SearchStats {
        SearchStats {
            iterations,
            cancelled,
            node_count: tree.len(),
            max_depth: tree.max_depth(),
            root_visits: tree.get(tree.root()).visits(),
            elapsed: started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Action, Path2D, Point2D, Pose2D};
    use crate::config::{ExplorationConfig, FinalSelection};
    use crate::exploration::{Exploration, ExplorationAction, ExplorationState, FreeSpace};
    use std::f64::consts::PI;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn origin() -> ExplorationState {
        ExplorationState::new(Pose2D::origin(), 1.0)
    }

    fn free_mdp() -> Exploration<FreeSpace> {
        let config = ExplorationConfig::default().with_sampling(8, 1.0, PI);
        Exploration::new(config, FreeSpace).unwrap()
    }

    type RewardFn = fn(&ExplorationState, &ExplorationAction) -> PlannerResult<f64>;

    /// Reward grows with progress along +x.
    fn eastward_reward(s: &ExplorationState, a: &ExplorationAction) -> PlannerResult<f64> {
        Ok(a.perform(s).position().x - s.position().x)
    }

    fn eastward_mdp() -> Exploration<FreeSpace, RewardFn> {
        let config = ExplorationConfig::default().with_sampling(6, 1.0, PI);
        Exploration::with_reward(config, FreeSpace, eastward_reward as RewardFn).unwrap()
    }

    #[test]
    fn test_search_returns_feasible_recommendation() {
        let mut search = TreeSearch::new(free_mdp(), SearchConfig::for_testing()).unwrap();
        let outcome = search.plan(origin()).unwrap();
        let rec = outcome.recommendation().expect("free space always has an action");

        assert_eq!(rec.stats.iterations, 50);
        assert_eq!(rec.stats.root_visits, 50);
        let end = rec.action.final_state().unwrap();
        assert!((end.position().distance(&Point2D::origin()) - 1.0).abs() < 1e-9);
        assert_eq!(end, &rec.state);
    }

    #[test]
    fn test_root_visits_equal_child_visits() {
        let mut search = TreeSearch::new(free_mdp(), SearchConfig::for_testing()).unwrap();
        search.plan(origin()).unwrap();
        let tree = search.tree().unwrap();
        let root = tree.get(tree.root());
        let child_sum: u32 = root.children().iter().map(|&c| tree.get(c).visits()).sum();
        assert_eq!(root.visits(), child_sum);
        assert_eq!(root.children().len() + root.potential_children().len(), 8);
    }

    #[test]
    fn test_no_feasible_action_is_reported() {
        let blocked = |_: &ExplorationState, _: &Path2D| -> PlannerResult<bool> { Ok(false) };
        let mdp = Exploration::new(ExplorationConfig::default(), blocked).unwrap();
        let mut search = TreeSearch::new(mdp, SearchConfig::for_testing()).unwrap();
        let outcome = search.plan(origin()).unwrap();
        assert!(outcome.is_no_feasible_action());
        assert_eq!(outcome.stats().iterations, 0);
    }

    #[test]
    fn test_oracle_failure_aborts_planning() {
        let broken = |_: &ExplorationState, p: &Path2D| -> PlannerResult<bool> {
            if p.last().map_or(false, |q| q.distance(&Point2D::origin()) > 1.5) {
                Err(PlannerError::Oracle("map unavailable".to_string()))
            } else {
                Ok(true)
            }
        };
        let mdp = Exploration::new(ExplorationConfig::default(), broken).unwrap();
        let mut search = TreeSearch::new(mdp, SearchConfig::for_testing()).unwrap();
        assert!(matches!(search.plan(origin()), Err(PlannerError::Oracle(_))));
    }

    #[test]
    fn test_zero_speed_root_has_no_feasible_action() {
        let mut search = TreeSearch::new(free_mdp(), SearchConfig::for_testing()).unwrap();
        let stopped = ExplorationState::new(Pose2D::origin(), 0.0);
        // every candidate is infeasible without a positive speed limit
        assert!(search.plan(stopped).unwrap().is_no_feasible_action());
    }

    #[test]
    fn test_seeded_search_is_deterministic() {
        let run = |seed| {
            let config = SearchConfig::for_testing().with_seed(seed);
            let mut search = TreeSearch::new(eastward_mdp(), config).unwrap();
            let rec = search.plan(origin()).unwrap().into_recommendation().unwrap();
            (rec.action_id, rec.children)
        };
        assert_eq!(run(17), run(17));
    }

    #[test]
    fn test_search_prefers_rewarding_direction() {
        // Without rollouts a child's mean is exactly its edge reward
        let mut config = SearchConfig::for_testing().with_final_selection(FinalSelection::MaxMean);
        config.rollout_depth = 0;
        let mut search = TreeSearch::new(eastward_mdp(), config).unwrap();
        let rec = search.plan(origin()).unwrap().into_recommendation().unwrap();

        let tree = search.tree().unwrap();
        let root = tree.get(tree.root());
        assert_eq!(root.children().len(), 6);
        let best_x = root
            .children()
            .iter()
            .map(|&c| tree.get(c).state().position().x)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(rec.state.position().x, best_x);
    }

    #[test]
    fn test_cancelled_search_returns_best_so_far() {
        let token = CancelToken::new();
        token.cancel();
        let mut search = TreeSearch::new(free_mdp(), SearchConfig::for_testing())
            .unwrap()
            .with_cancel_token(token);
        let outcome = search.plan(origin()).unwrap();
        let stats = outcome.stats().clone();
        assert!(stats.cancelled);
        assert_eq!(stats.iterations, 1);
        assert!(outcome.recommendation().is_some());
    }

    #[test]
    fn test_commit_reuses_subtree() {
        let mut search = TreeSearch::new(free_mdp(), SearchConfig::for_testing()).unwrap();
        let rec = search.plan(origin()).unwrap().into_recommendation().unwrap();
        let kept_visits = rec.visits;

        let new_state = search.commit(rec.action_id).unwrap();
        assert_eq!(new_state, rec.state);
        let tree = search.tree().unwrap();
        let root = tree.get(tree.root());
        assert!(root.is_root());
        assert_eq!(root.visits(), kept_visits);

        let outcome = search.resume().unwrap();
        assert_eq!(outcome.stats().root_visits, kept_visits + 50);
    }

    #[test]
    fn test_commit_unknown_action_fails() {
        let mut search = TreeSearch::new(free_mdp(), SearchConfig::for_testing()).unwrap();
        assert!(matches!(search.commit(ActionId(0)), Err(PlannerError::StateError(_))));
        search.plan(origin()).unwrap();
        assert!(search.commit(ActionId(999)).is_err());
    }

    #[test]
    fn test_leaf_parallel_rollouts_visit_once_per_rollout() {
        let config = SearchConfig::for_testing().with_iterations(10).with_leaf_rollouts(4);
        let mut search = TreeSearch::new(free_mdp(), config.clone()).unwrap();
        let outcome = search.plan(origin()).unwrap();
        assert_eq!(outcome.stats().root_visits, 40);

        let mut again = TreeSearch::new(free_mdp(), config).unwrap();
        let repeat = again.plan(origin()).unwrap();
        assert_eq!(
            outcome.recommendation().unwrap().children,
            repeat.recommendation().unwrap().children
        );
    }

    /// Oracle that fails for any motion not starting at the origin until `healthy` is set.
    fn flaky_map(
        healthy: Arc<AtomicBool>,
    ) -> impl Fn(&ExplorationState, &Path2D) -> PlannerResult<bool> + Send + Sync {
        move |s: &ExplorationState, _: &Path2D| -> PlannerResult<bool> {
            if healthy.load(Ordering::SeqCst) || s.position() == Point2D::origin() {
                Ok(true)
            } else {
                Err(PlannerError::Oracle("map unavailable".to_string()))
            }
        }
    }

    #[test]
    fn test_failed_expansion_keeps_untried_action() {
        let healthy = Arc::new(AtomicBool::new(false));
        let config = ExplorationConfig::default().with_sampling(8, 1.0, PI);
        let mdp = Exploration::new(config, flaky_map(healthy.clone())).unwrap();
        let mut search = TreeSearch::new(mdp, SearchConfig::for_testing()).unwrap();

        assert!(matches!(search.plan(origin()), Err(PlannerError::Oracle(_))));
        let tree = search.tree().unwrap();
        let root = tree.get(tree.root());
        assert_eq!(root.potential_children().len(), 8);
        assert!(root.children().is_empty());

        healthy.store(true, Ordering::SeqCst);
        search.resume().unwrap();
        let tree = search.tree().unwrap();
        let root = tree.get(tree.root());
        assert_eq!(root.children().len() + root.potential_children().len(), 8);
        assert_eq!(tree.child_action_ids(tree.root())[0], ActionId(0));
    }

    #[test]
    fn test_time_budget_stops_search() {
        let config = SearchConfig::for_testing()
            .with_iterations(1_000_000)
            .with_time_budget(Duration::from_millis(1));
        let mut search = TreeSearch::new(free_mdp(), config).unwrap();
        let outcome = search.plan(origin()).unwrap();
        let stats = outcome.stats();
        assert!(stats.cancelled);
        assert!(stats.iterations >= 1);
        assert!(stats.iterations < 1_000_000);
        assert!(outcome.recommendation().is_some());
    }

    #[test]
    fn test_stricter_oracle_prunes_untried_actions_on_resume() {
        let blocked = Arc::new(AtomicBool::new(false));
        let gate = blocked.clone();
        let oracle = move |_: &ExplorationState, _: &Path2D| -> PlannerResult<bool> {
            Ok(!gate.load(Ordering::SeqCst))
        };
        let config = ExplorationConfig::default().with_sampling(8, 1.0, PI);
        let mdp = Exploration::new(config, oracle).unwrap();
        let mut search = TreeSearch::new(mdp, SearchConfig::for_testing().with_iterations(3)).unwrap();

        search.plan(origin()).unwrap();
        let tree = search.tree().unwrap();
        assert_eq!(tree.get(tree.root()).children().len(), 3);
        assert_eq!(tree.get(tree.root()).potential_children().len(), 5);

        blocked.store(true, Ordering::SeqCst);
        let outcome = search.resume().unwrap();
        let tree = search.tree().unwrap();
        let root = tree.get(tree.root());
        assert!(root.potential_children().is_empty());
        assert_eq!(root.children().len(), 3);
        assert_eq!(outcome.stats().root_visits, 6);
        assert!(outcome.recommendation().is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig::for_testing().with_iterations(0);
        assert!(TreeSearch::new(free_mdp(), config).is_err());
    }
}
