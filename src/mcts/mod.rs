//! Monte Carlo tree search engine
//!
//! Arena-backed search tree, pluggable value and rollout strategies, the
//! sequential search loop and the root-parallel driver.

pub mod node;
pub mod tree;
pub mod value;
pub mod rollout;
pub mod cancel;
pub mod search;
pub mod parallel;

pub use node::{Node, NodeId};
pub use tree::{ChildStats, SearchTree};
pub use value::{MeanValue, Uct, ValueFunction};
pub use rollout::{rollout, RolloutBudget, RolloutPolicy, UniformRollout};
pub use cancel::CancelToken;
pub use search::{PlanOutcome, Recommendation, SearchStats, TreeSearch};
pub use parallel::plan_root_parallel;
