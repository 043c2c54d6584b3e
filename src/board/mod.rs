//! Board representation and game-state types.
//!
//! Contains the piece and coordinate primitives and the overall game state.

pub mod piece;
pub mod state;

pub use piece::{Move, Piece, PieceKind, Side, Square, COLS, ROWS, SQUARE_COUNT};
pub use state::{Board, BoardError, TrialMove, DEFAULT_DRAW_LIMIT};
