// Receding-horizon frontier exploration with Monte Carlo tree search.
//
// The robot re-plans after every executed step: a fresh tree is searched
// from the current pose, the recommended motion is executed, and frontier
// clusters within reach are marked as explored.

use gnuplot::{AxesCommon, Caption, Color, Figure, PointSize, PointSymbol};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use frontier_mcts::common::Action;
use frontier_mcts::exploration::{AllOf, WorkspaceBounds};
use frontier_mcts::{
    AreaBounds, CircleObstacleMap, Exploration, ExplorationAction, ExplorationConfig, ExplorationState,
    PlanOutcome, PlannerResult, Point2D, Pose2D, SearchConfig, TreeSearch,
};

const SHOW_ANIMATION: bool = true;

const MAX_STEPS: usize = 60;
const REACHED_DISTANCE: f64 = 1.0;
const PROGRESS_WEIGHT: f64 = 2.0;

/// Travel penalty plus a bonus for closing in on the nearest frontier.
fn frontier_progress_reward(
    frontiers: Vec<Point2D>,
) -> impl Fn(&ExplorationState, &ExplorationAction) -> PlannerResult<f64> + Clone + Send + Sync {
    move |state: &ExplorationState, action: &ExplorationAction| {
        let end = action.end_point(state);
        let start = state.position();
        let progress = frontiers
            .iter()
            .map(|f| start.distance(f) - end.distance(f))
            .fold(f64::NEG_INFINITY, f64::max);
        let progress = if progress.is_finite() { progress } else { 0.0 };
        Ok(PROGRESS_WEIGHT * progress - action.cost(state)?)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("Frontier exploration start!!");

    let obstacles = CircleObstacleMap::from_tuples(
        &[(5.0, 5.0, 1.0), (3.0, 6.0, 2.0), (3.0, 8.0, 2.0), (7.0, 5.0, 2.0), (9.0, 5.0, 2.0), (8.0, 10.0, 1.0)],
        0.3,
    );
    let workspace = WorkspaceBounds::new(AreaBounds::new(-2.0, 15.0, -2.0, 15.0));
    let mut frontiers = vec![
        Point2D::new(12.0, 2.0),
        Point2D::new(12.0, 12.0),
        Point2D::new(0.0, 13.0),
    ];

    let exploration = ExplorationConfig::default().with_sampling(10, 1.0, std::f64::consts::PI);
    let search_config = SearchConfig {
        iterations: 300,
        rollout_depth: 8,
        ..Default::default()
    };

    let mut state = ExplorationState::new(Pose2D::origin(), 1.0);
    let mut h_x = vec![state.position().x];
    let mut h_y = vec![state.position().y];

    for step in 0..MAX_STEPS {
        if frontiers.is_empty() {
            info!(step, "all frontiers explored");
            break;
        }

        let oracle = AllOf::new(obstacles.clone(), workspace.clone());
        let mdp = Exploration::with_reward(exploration.clone(), oracle, frontier_progress_reward(frontiers.clone()))?
            .with_frontiers(frontiers.clone());
        let mut search = TreeSearch::new(mdp, search_config.clone().with_seed(step as u64))?;

        let rec = match search.plan(state)? {
            PlanOutcome::Recommended(rec) => rec,
            PlanOutcome::NoFeasibleAction { .. } => {
                warn!(step, "robot is boxed in, stopping");
                break;
            }
        };

        state = rec.state;
        h_x.push(state.position().x);
        h_y.push(state.position().y);
        frontiers.retain(|f| f.distance(&state.position()) > REACHED_DISTANCE);

        info!(
            step,
            x = state.position().x,
            y = state.position().y,
            visits = rec.visits,
            remaining = frontiers.len(),
            "executed action"
        );
    }

    if SHOW_ANIMATION {
        let ox: Vec<f64> = obstacles.obstacles().iter().map(|o| o.x).collect();
        let oy: Vec<f64> = obstacles.obstacles().iter().map(|o| o.y).collect();
        let fx: Vec<f64> = frontiers.iter().map(|f| f.x).collect();
        let fy: Vec<f64> = frontiers.iter().map(|f| f.y).collect();

        let mut fg = Figure::new();
        fg.axes2d()
            .points(&ox, &oy, &[Caption("Obstacles"), Color("black"), PointSymbol('O'), PointSize(3.0)])
            .points(&fx, &fy, &[Caption("Unexplored frontiers"), Color("blue"), PointSymbol('x')])
            .lines(&h_x, &h_y, &[Caption("Trajectory"), Color("red")])
            .set_aspect_ratio(gnuplot::AutoOption::Fix(1.0));

        if let Err(e) = fg.show() {
            warn!(error = %e, "could not open gnuplot");
        }
    }

    info!("Frontier exploration completed!");
    Ok(())
}
