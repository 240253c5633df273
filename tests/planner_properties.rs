//! Property-based and end-to-end tests for the exploration planner.
//!
//! - Random-walk kinematics and travel cost
//! - Node statistics bookkeeping
//! - Oracle filtering of root candidates
//! - Seeded determinism of the full search

use std::f64::consts::PI;

use approx::assert_relative_eq;
use frontier_mcts::exploration::RandomWalkAction;
use frontier_mcts::mcts::Node;
use frontier_mcts::{
    Action, ActionId, ActionSet, DecisionProcess, Exploration, ExplorationAction, ExplorationConfig, ExplorationState,
    FreeSpace, Path2D, PlannerResult, Point2D, Pose2D, SearchConfig, TreeSearch,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// =============================================================================
// Strategies
// =============================================================================

fn arb_pose() -> impl Strategy<Value = Pose2D> {
    (-50.0f64..50.0, -50.0f64..50.0, -PI..PI).prop_map(|(x, y, yaw)| Pose2D::new(x, y, yaw))
}

fn arb_speed() -> impl Strategy<Value = f64> {
    0.1f64..5.0
}

fn origin() -> ExplorationState {
    ExplorationState::new(Pose2D::origin(), 1.0)
}

/// 8 samples, unit displacement, 180 degree spread
fn scenario_config() -> ExplorationConfig {
    ExplorationConfig::default().with_sampling(8, 1.0, PI)
}

// =============================================================================
// Random-walk kinematics
// =============================================================================

proptest! {
    #[test]
    fn prop_random_walk_lands_at_displacement(
        pose in arb_pose(),
        speed in arb_speed(),
        angle in -PI..PI,
        displacement in 0.0f64..10.0,
    ) {
        let state = ExplorationState::new(pose, speed);
        let action = RandomWalkAction::new(angle, displacement);
        let next = action.perform(&state);

        prop_assert!((next.position().x - (pose.x + displacement * angle.cos())).abs() < 1e-9);
        prop_assert!((next.position().y - (pose.y + displacement * angle.sin())).abs() < 1e-9);
        prop_assert!((next.max_speed() - speed).abs() < 1e-12);
        prop_assert!((action.cost(&state).unwrap() - displacement / speed).abs() < 1e-9);
    }

    #[test]
    fn prop_cost_grows_with_displacement(
        speed in arb_speed(),
        short in 0.0f64..5.0,
        extra in 0.0f64..5.0,
    ) {
        let state = ExplorationState::new(Pose2D::origin(), speed);
        let near = RandomWalkAction::new(0.0, short).cost(&state).unwrap();
        let far = RandomWalkAction::new(0.0, short + extra).cost(&state).unwrap();
        prop_assert!(near >= 0.0);
        prop_assert!(far >= near);

        let faster = ExplorationState::new(Pose2D::origin(), speed * 2.0);
        let quick = RandomWalkAction::new(0.0, short).cost(&faster).unwrap();
        prop_assert!(quick <= near);
    }

    #[test]
    fn prop_add_visit_accumulates(values in prop::collection::vec(-100.0f64..100.0, 0..50)) {
        let mut node: Node<(), u32> = Node::new_root((), ActionSet::new());
        for &v in &values {
            node.add_visit(v);
        }
        prop_assert_eq!(node.visits() as usize, values.len());
        prop_assert!((node.value_sum() - values.iter().sum::<f64>()).abs() < 1e-6);
        prop_assert!(node.is_root());
    }

    #[test]
    fn prop_root_candidates_are_feasible(seed in any::<u64>()) {
        let blocked_west = |_: &ExplorationState, path: &Path2D| -> PlannerResult<bool> {
            Ok(path.points.iter().all(|p| p.x >= -0.5))
        };
        let mdp = Exploration::new(scenario_config(), blocked_west).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let actions = mdp.potential_feasible_actions(&origin(), &mut rng).unwrap();
        for action in actions.values() {
            prop_assert!(mdp.is_feasible(&origin(), action).unwrap());
        }
    }

    #[test]
    fn prop_seeded_search_is_deterministic(seed in any::<u64>()) {
        let run = || {
            let mdp = Exploration::new(scenario_config(), FreeSpace).unwrap();
            let config = SearchConfig::for_testing().with_seed(seed);
            TreeSearch::new(mdp, config)
                .unwrap()
                .plan(origin())
                .unwrap()
                .into_recommendation()
                .unwrap()
        };
        let (a, b) = (run(), run());
        prop_assert_eq!(a.action_id, b.action_id);
        prop_assert_eq!(a.children, b.children);
        prop_assert_eq!(a.state.pose(), b.state.pose());
    }
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn test_open_field_scenario() {
    let mdp = Exploration::new(scenario_config(), FreeSpace).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let root_actions = mdp.potential_feasible_actions(&origin(), &mut rng).unwrap();

    assert_eq!(root_actions.len(), 8);
    let ids: Vec<ActionId> = root_actions.keys().copied().collect();
    assert_eq!(ids, (0..8).map(ActionId).collect::<Vec<_>>());
    for action in root_actions.values() {
        assert_relative_eq!(action.cost(&origin()).unwrap(), 1.0, epsilon = 1e-9);
    }

    let mut search = TreeSearch::new(mdp, SearchConfig::default().with_seed(42)).unwrap();
    let rec = search.plan(origin()).unwrap().into_recommendation().unwrap();

    assert_relative_eq!(rec.state.position().distance(&Point2D::origin()), 1.0, epsilon = 1e-9);
    assert_relative_eq!(rec.action.cost(&origin()).unwrap(), 1.0, epsilon = 1e-9);
    assert_eq!(rec.children.len(), 8);
    assert_eq!(rec.stats.root_visits, SearchConfig::default().iterations as u32);
    let total: u32 = rec.children.iter().map(|c| c.visits).sum();
    assert_eq!(total, rec.stats.root_visits);
}

#[test]
fn test_forward_half_plane_oracle_scenario() {
    let config = ExplorationConfig::default().with_sampling(8, 1.0, 2.0 * PI);
    let forward_only = |s: &ExplorationState, path: &Path2D| -> PlannerResult<bool> {
        let Some(end) = path.last() else {
            return Ok(false);
        };
        let heading = (end.y - s.position().y).atan2(end.x - s.position().x);
        Ok(heading.abs() <= PI / 2.0)
    };
    let mdp = Exploration::new(config, forward_only).unwrap();

    for seed in 0..10u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let offsets = mdp.sample_displacement_angles(&mut rng);
        let expected = offsets.iter().filter(|a| a.abs() <= PI / 2.0).count();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let actions = mdp.potential_feasible_actions(&origin(), &mut rng).unwrap();
        assert_eq!(actions.len(), expected, "seed {}", seed);
    }
}

#[test]
fn test_receding_horizon_reaches_frontier() {
    let target = Point2D::new(4.0, 0.0);
    let mut state = origin();

    for step in 0..20u64 {
        if state.position().distance(&target) < 0.5 {
            break;
        }
        // progress toward the target minus a small travel penalty
        let progress = move |s: &ExplorationState, a: &ExplorationAction| -> PlannerResult<f64> {
            Ok(s.position().distance(&target) - a.end_point(s).distance(&target) - a.cost(s)? * 0.1)
        };
        let mdp = Exploration::with_reward(scenario_config(), FreeSpace, progress)
            .unwrap()
            .with_frontiers(vec![target]);
        let config = SearchConfig::for_testing().with_seed(step);
        let rec = TreeSearch::new(mdp, config)
            .unwrap()
            .plan(state)
            .unwrap()
            .into_recommendation()
            .unwrap();
        state = rec.state;
    }

    assert!(state.position().distance(&target) < 0.5);
}
