//! Common types, traits, and error definitions for frontier_mcts
//!
//! This module provides the foundational building blocks shared by the
//! exploration model and the tree search engine.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
