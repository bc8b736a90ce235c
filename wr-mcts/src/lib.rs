//! POMCTS planner for wormhole rolling.
//!
//! The search tree branches on (action, observation) pairs: the same round
//! trip leads to different belief states depending on which visual bucket the
//! hole lands in, so each pair gets its own child and its own Bayesian
//! update. The design uses:
//! - a fixed, ordered jump catalog (`wr-core`)
//! - arena-backed node storage with a flat (node, action, observation)
//!   child index
//! - uniform world sampling from the root belief, UCB1 selection aggregated
//!   over observation children, greedy high-mass rollouts, and a decayed
//!   success score

pub mod node;
pub mod results;
pub mod search;
pub mod tree;

pub use node::{Node, NodeId};
pub use results::{ActionResult, BestAction, TripBucket};
pub use search::{PlanError, Planner};
pub use tree::{ActionStats, Tree};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod search_tests;
