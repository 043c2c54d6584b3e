//! Xiangqi engine library.
//!
//! Exposes the rules engine, move generation, the network input encoding,
//! evaluators, Monte-Carlo Tree Search, text notation and the self-play
//! driver for use by integration tests and the `selfplay` binary.

pub mod board;
pub mod engine;
pub mod eval;
pub mod movegen;
pub mod nn;
pub mod protocol;
pub mod search;
pub mod selfplay;
