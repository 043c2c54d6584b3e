//! Move generation.
//!
//! Produces destination squares for a single piece, or every move of a side.
//! Destinations respect board bounds, blocking, and the no-capture-own-piece
//! rule, but are NOT filtered for leaving one's own king in check. That
//! filter exists only inside checkmate detection.

pub mod pieces;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, Move, PieceKind, Side, Square, SQUARE_COUNT};

/// Appends the destinations of the piece on `sq` to `out`.
///
/// Does nothing if the square is empty.
pub fn destinations_into(board: &Board, sq: Square, out: &mut Vec<Square>) {
    let piece = match board.piece_at(sq) {
        Some(p) => p,
        None => return,
    };
    match piece.kind {
        PieceKind::King => pieces::king(board, sq, piece.side, out),
        PieceKind::Advisor => pieces::advisor(board, sq, piece.side, out),
        PieceKind::Elephant => pieces::elephant(board, sq, piece.side, out),
        PieceKind::Knight => pieces::knight(board, sq, piece.side, out),
        PieceKind::Rook => pieces::rook(board, sq, piece.side, out),
        PieceKind::Cannon => pieces::cannon(board, sq, piece.side, out),
        PieceKind::Pawn => pieces::pawn(board, sq, piece.side, out),
    }
}

/// Generates the destinations of the piece on `sq`.
///
/// Returns an empty vec if no piece stands there.
pub fn legal_moves(board: &Board, sq: Square) -> Vec<Square> {
    let mut out = Vec::with_capacity(17);
    destinations_into(board, sq, &mut out);
    out
}

/// Generates every move for `side`, scanning squares row-major.
pub fn all_moves(board: &Board, side: Side) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    let mut buf = Vec::with_capacity(17);
    for i in 0..SQUARE_COUNT {
        let from = Square::from_index(i);
        match board.piece_at(from) {
            Some(p) if p.side == side => {}
            _ => continue,
        }
        buf.clear();
        destinations_into(board, from, &mut buf);
        moves.extend(buf.iter().map(|&to| Move::new(from, to)));
    }
    moves
}

/// Picks a uniformly random move of the side to move, or None if it has none.
pub fn random_move(board: &Board, rng: &mut impl Rng) -> Option<Move> {
    all_moves(board, board.side_to_move()).choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{COLS, Piece, ROWS};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn seeded_rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn empty_square_has_no_moves() {
        let board = Board::new();
        assert!(legal_moves(&board, Square::new(5, 4)).is_empty());
    }

    #[test]
    fn all_moves_only_for_side() {
        let board = Board::new();
        for mv in all_moves(&board, Side::Black) {
            assert_eq!(board.piece_at(mv.from).map(|p| p.side), Some(Side::Black));
        }
        assert_eq!(all_moves(&board, Side::Black).len(), 44);
    }

    #[test]
    fn random_move_is_legal() {
        let board = Board::new();
        let mut rng = seeded_rng();
        for _ in 0..50 {
            let mv = random_move(&board, &mut rng).unwrap();
            assert!(board.validate(mv).is_ok(), "generated illegal move {}", mv);
        }
    }

    #[test]
    fn random_move_none_without_pieces() {
        let board = Board::empty();
        assert_eq!(random_move(&board, &mut seeded_rng()), None);
    }

    #[test]
    fn random_playouts_respect_geometry() {
        // Plays random games and checks board-bound, own-piece, palace and
        // river invariants on every generated destination.
        for seed in 0..8 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut board = Board::new();
            for _ in 0..200 {
                if board.game_over() {
                    break;
                }
                for mv in board.all_moves() {
                    assert!((mv.to.row as usize) < ROWS && (mv.to.col as usize) < COLS);
                    let piece: Piece = board.piece_at(mv.from).unwrap();
                    if let Some(target) = board.piece_at(mv.to) {
                        assert_ne!(target.side, piece.side, "{} captures own piece", mv);
                    }
                    match piece.kind {
                        PieceKind::King => {
                            let flying = board.piece_at(mv.to)
                                == Some(Piece::new(piece.side.opponent(), PieceKind::King));
                            assert!(mv.to.in_palace(piece.side) || flying);
                        }
                        PieceKind::Advisor => assert!(mv.to.in_palace(piece.side)),
                        PieceKind::Elephant => assert!(piece.side.owns_row(mv.to.row)),
                        _ => {}
                    }
                }
                let mv = random_move(&board, &mut rng).unwrap();
                board.apply_move(mv).unwrap();
            }
        }
    }
}
