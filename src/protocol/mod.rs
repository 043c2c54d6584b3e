//! Text protocol helpers.
//!
//! Notation for positions and moves, used by self-play records and tests.

pub mod notation;

pub use notation::{
    diagram, encode_board, encode_position, parse_board, parse_move, parse_position,
    NotationError, INITIAL,
};
