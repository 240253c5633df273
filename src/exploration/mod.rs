//! Exploration decision model: robot state, motion actions, feasibility
//! oracles and rewards for frontier exploration.

pub mod state;
pub mod random_walk;
pub mod frontier;
pub mod action;
pub mod oracle;
pub mod reward;
pub mod mdp;

pub use state::ExplorationState;
pub use random_walk::RandomWalkAction;
pub use frontier::FrontierClusterAction;
pub use action::ExplorationAction;
pub use oracle::{AllOf, CircleObstacleMap, FreeSpace, WorkspaceBounds};
pub use reward::TravelCostPenalty;
pub use mdp::Exploration;
