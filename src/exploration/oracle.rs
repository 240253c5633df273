//! Feasibility oracles for proposed robot motions

use crate::common::{AreaBounds, CircleObstacle, FeasibilityOracle, Path2D, PlannerResult};
use crate::exploration::state::ExplorationState;

/// Obstacle-free world: every path is feasible.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeSpace;

impl<S> FeasibilityOracle<S> for FreeSpace {
    fn check(&self, _start: &S, _path: &Path2D) -> PlannerResult<bool> {
        Ok(true)
    }
}

/// Circular obstacles inflated by the robot radius
#[derive(Debug, Clone)]
pub struct CircleObstacleMap {
    obstacles: Vec<CircleObstacle>,
    robot_radius: f64,
}

impl CircleObstacleMap {
    pub fn new(obstacles: Vec<CircleObstacle>, robot_radius: f64) -> Self {
        Self {
            obstacles,
            robot_radius,
        }
    }

    pub fn from_tuples(obstacle_list: &[(f64, f64, f64)], robot_radius: f64) -> Self {
        let obstacles = obstacle_list
            .iter()
            .map(|&(x, y, r)| CircleObstacle::new(x, y, r))
            .collect();
        Self::new(obstacles, robot_radius)
    }

    pub fn obstacles(&self) -> &[CircleObstacle] {
        &self.obstacles
    }

    fn is_collision_free(&self, path: &Path2D) -> bool {
        for obs in &self.obstacles {
            for p in &path.points {
                let dx = obs.x - p.x;
                let dy = obs.y - p.y;
                let d = (dx * dx + dy * dy).sqrt();
                if d <= obs.radius + self.robot_radius {
                    return false;
                }
            }
        }
        true
    }
}

impl FeasibilityOracle<ExplorationState> for CircleObstacleMap {
    fn check(&self, _start: &ExplorationState, path: &Path2D) -> PlannerResult<bool> {
        Ok(self.is_collision_free(path))
    }
}

/// Every sample of the path must stay inside the workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceBounds {
    area: AreaBounds,
}

impl WorkspaceBounds {
    pub fn new(area: AreaBounds) -> Self {
        Self { area }
    }
}

impl<S> FeasibilityOracle<S> for WorkspaceBounds {
    fn check(&self, _start: &S, path: &Path2D) -> PlannerResult<bool> {
        Ok(path.points.iter().all(|p| self.area.contains(p)))
    }
}

/// Conjunction of two oracles; the second is only consulted when the first
/// accepts.
#[derive(Debug, Clone)]
pub struct AllOf<A, B> {
    first: A,
    second: B,
}

impl<A, B> AllOf<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<S, A, B> FeasibilityOracle<S> for AllOf<A, B>
where
    A: FeasibilityOracle<S>,
    B: FeasibilityOracle<S>,
{
    fn check(&self, start: &S, path: &Path2D) -> PlannerResult<bool> {
        Ok(self.first.check(start, path)? && self.second.check(start, path)?)
    }
}
