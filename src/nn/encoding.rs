//! Board -> tensor encoding for neural network inference.
//!
//! Produces a [10, 9, 9] f32 tensor (rows, columns, channels), flattened
//! row-major so that element `(row, col, ch)` sits at `(row * 9 + col) * 9 + ch`.
//!
//! Channel layout per square:
//!   [0:7] piece kind: [rook, knight, elephant, advisor, king, cannon, pawn],
//!         +1 for a red piece, -1 for a black piece
//!   [7]   last move: -1 on its source square, +1 on its destination
//!   [8]   side to move: 1 everywhere when red is to move, else 0

use crate::board::{Board, Move, PieceKind, Side, Square, COLS, ROWS};

/// Number of channels per square.
pub const NUM_CHANNELS: usize = 9;

/// Tensor shape without the batch dimension.
pub const TENSOR_SHAPE: [usize; 3] = [ROWS, COLS, NUM_CHANNELS];

/// Flattened tensor length.
pub const TENSOR_LEN: usize = ROWS * COLS * NUM_CHANNELS;

const CH_LAST_MOVE: usize = 7;
const CH_SIDE_TO_MOVE: usize = 8;

#[inline]
fn kind_channel(kind: PieceKind) -> usize {
    match kind {
        PieceKind::Rook => 0,
        PieceKind::Knight => 1,
        PieceKind::Elephant => 2,
        PieceKind::Advisor => 3,
        PieceKind::King => 4,
        PieceKind::Cannon => 5,
        PieceKind::Pawn => 6,
    }
}

#[inline]
fn offset(sq: Square, channel: usize) -> usize {
    sq.index() * NUM_CHANNELS + channel
}

/// Encodes `board`, with `last_move` being the move that produced it.
pub fn encode_position(board: &Board, last_move: Option<Move>) -> [f32; TENSOR_LEN] {
    let mut tensor = [0.0f32; TENSOR_LEN];
    let turn = if board.side_to_move() == Side::Red { 1.0 } else { 0.0 };

    for row in 0..ROWS {
        for col in 0..COLS {
            let sq = Square::new(row as u8, col as u8);
            if let Some(piece) = board.piece_at(sq) {
                tensor[offset(sq, kind_channel(piece.kind))] = piece.side.sign();
            }
            tensor[offset(sq, CH_SIDE_TO_MOVE)] = turn;
        }
    }

    if let Some(mv) = last_move {
        tensor[offset(mv.from, CH_LAST_MOVE)] = -1.0;
        tensor[offset(mv.to, CH_LAST_MOVE)] = 1.0;
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(tensor: &[f32], row: u8, col: u8, ch: usize) -> f32 {
        tensor[offset(Square::new(row, col), ch)]
    }

    #[test]
    fn initial_position_pieces() {
        let t = encode_position(&Board::new(), None);
        assert_eq!(at(&t, 9, 0, 0), 1.0, "red rook");
        assert_eq!(at(&t, 0, 0, 0), -1.0, "black rook");
        assert_eq!(at(&t, 9, 4, 4), 1.0, "red king");
        assert_eq!(at(&t, 0, 4, 4), -1.0, "black king");
        assert_eq!(at(&t, 7, 1, 5), 1.0, "red cannon");
        assert_eq!(at(&t, 3, 0, 6), -1.0, "black pawn");
        assert_eq!(at(&t, 4, 4, 0), 0.0);

        let piece_sum: f32 = (0..ROWS * COLS)
            .flat_map(|i| (0..7).map(move |ch| i * NUM_CHANNELS + ch))
            .map(|i| t[i])
            .sum();
        assert_eq!(piece_sum, 0.0, "sides are symmetric");
    }

    #[test]
    fn side_to_move_channel() {
        let mut board = Board::new();
        let red = encode_position(&board, None);
        assert!((0..ROWS * COLS).all(|i| red[i * NUM_CHANNELS + CH_SIDE_TO_MOVE] == 1.0));

        board.set_side_to_move(Side::Black);
        let black = encode_position(&board, None);
        assert!((0..ROWS * COLS).all(|i| black[i * NUM_CHANNELS + CH_SIDE_TO_MOVE] == 0.0));
    }

    #[test]
    fn last_move_channel() {
        let mut board = Board::new();
        let mv = Move::new(Square::new(7, 1), Square::new(7, 4));
        board.apply_move(mv).unwrap();
        let t = encode_position(&board, Some(mv));
        assert_eq!(at(&t, 7, 1, CH_LAST_MOVE), -1.0);
        assert_eq!(at(&t, 7, 4, CH_LAST_MOVE), 1.0);
        let marked = (0..ROWS * COLS)
            .filter(|i| t[i * NUM_CHANNELS + CH_LAST_MOVE] != 0.0)
            .count();
        assert_eq!(marked, 2);
    }

    #[test]
    fn shape_matches_length() {
        assert_eq!(TENSOR_SHAPE.iter().product::<usize>(), TENSOR_LEN);
    }
}
