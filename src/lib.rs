//! frontier_mcts - Monte Carlo tree search planner for robot frontier exploration
//!
//! The planner picks the next motion of a robot exploring unknown space.
//! From the current state it grows a search tree of hypothetical futures,
//! scores each candidate motion with simulated rollouts and recommends the
//! best one.
//!
//! ```rust,ignore
//! use frontier_mcts::{Exploration, ExplorationConfig, ExplorationState, FreeSpace};
//! use frontier_mcts::{Pose2D, SearchConfig, TreeSearch};
//!
//! let mdp = Exploration::new(ExplorationConfig::default(), FreeSpace)?;
//! let mut search = TreeSearch::new(mdp, SearchConfig::default().with_seed(42))?;
//! let outcome = search.plan(ExplorationState::new(Pose2D::origin(), 1.0))?;
//! if let Some(rec) = outcome.recommendation() {
//!     println!("go to {:?}", rec.state.pose());
//! }
//! ```

// Core modules
pub mod common;
pub mod config;

// Algorithm modules
pub mod exploration;
pub mod mcts;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, Path2D, AreaBounds, CircleObstacle, ActionId};
pub use common::{Action, ActionSet, DecisionProcess, FeasibilityOracle, RewardModel, State};
pub use common::{PlannerError, PlannerResult};
pub use config::{ExplorationConfig, FinalSelection, PlannerConfig, SearchConfig};
pub use exploration::{Exploration, ExplorationAction, ExplorationState, FreeSpace, CircleObstacleMap};
pub use mcts::{plan_root_parallel, CancelToken, PlanOutcome, Recommendation, TreeSearch};
