//! Search and planning.
//!
//! Monte-Carlo Tree Search over Xiangqi positions, driven either by random
//! rollouts or by an evaluator's move priors and position values.

pub mod config;
pub mod mcts;
pub mod node;
pub mod policy;

pub use config::MctsConfig;
pub use mcts::{selection_score, ChildStats, Mcts, SearchError, SearchInfo, StopHandle};
pub use node::{NodeStats, SearchNode};
pub use policy::{rollout, Expansion, GuidedPolicy, LeafPolicy, LeafValue, RolloutPolicy, Scoring};
