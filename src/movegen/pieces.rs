//! Per-kind movement rules.
//!
//! Each function appends destinations for a piece of `side` standing on `sq`.
//! All of them accept empty or enemy-occupied targets and reject squares
//! held by a piece of the same side.

use crate::board::{Board, PieceKind, Side, Square};

const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Knight jumps paired with the orthogonal leg square that blocks them.
const KNIGHT_JUMPS: [((i8, i8), (i8, i8)); 8] = [
    ((-2, -1), (-1, 0)),
    ((-2, 1), (-1, 0)),
    ((2, -1), (1, 0)),
    ((2, 1), (1, 0)),
    ((-1, -2), (0, -1)),
    ((1, -2), (0, -1)),
    ((-1, 2), (0, 1)),
    ((1, 2), (0, 1)),
];

/// Whether a piece of `side` may land on `to` (empty or enemy).
#[inline]
fn can_land(board: &Board, to: Square, side: Side) -> bool {
    board.piece_at(to).map_or(true, |p| p.side != side)
}

/// One orthogonal step inside the palace, plus the flying-general capture
/// along an open file.
pub fn king(board: &Board, sq: Square, side: Side, out: &mut Vec<Square>) {
    for (dr, dc) in ORTHOGONAL {
        if let Some(to) = sq.offset(dr, dc) {
            if to.in_palace(side) && can_land(board, to, side) {
                out.push(to);
            }
        }
    }

    // Walk toward the enemy side until the first piece; it must be the enemy king.
    let step = side.forward();
    let mut cur = sq.offset(step, 0);
    while let Some(to) = cur {
        if let Some(p) = board.piece_at(to) {
            if p.side != side && p.kind == PieceKind::King {
                out.push(to);
            }
            break;
        }
        cur = to.offset(step, 0);
    }
}

/// One diagonal step inside the palace.
pub fn advisor(board: &Board, sq: Square, side: Side, out: &mut Vec<Square>) {
    for (dr, dc) in DIAGONAL {
        if let Some(to) = sq.offset(dr, dc) {
            if to.in_palace(side) && can_land(board, to, side) {
                out.push(to);
            }
        }
    }
}

/// Two diagonal steps on its own half, blocked by a piece on the midpoint.
pub fn elephant(board: &Board, sq: Square, side: Side, out: &mut Vec<Square>) {
    for (dr, dc) in DIAGONAL {
        let (to, eye) = match (sq.offset(2 * dr, 2 * dc), sq.offset(dr, dc)) {
            (Some(to), Some(eye)) => (to, eye),
            _ => continue,
        };
        if side.owns_row(to.row) && board.piece_at(eye).is_none() && can_land(board, to, side) {
            out.push(to);
        }
    }
}

/// Two-by-one jump, blocked by a piece on the adjacent leg square.
pub fn knight(board: &Board, sq: Square, side: Side, out: &mut Vec<Square>) {
    for ((dr, dc), (lr, lc)) in KNIGHT_JUMPS {
        let (to, leg) = match (sq.offset(dr, dc), sq.offset(lr, lc)) {
            (Some(to), Some(leg)) => (to, leg),
            _ => continue,
        };
        if board.piece_at(leg).is_none() && can_land(board, to, side) {
            out.push(to);
        }
    }
}

/// Slides orthogonally, stopping at (and capturing) the first piece.
pub fn rook(board: &Board, sq: Square, side: Side, out: &mut Vec<Square>) {
    for (dr, dc) in ORTHOGONAL {
        let mut cur = sq.offset(dr, dc);
        while let Some(to) = cur {
            match board.piece_at(to) {
                None => out.push(to),
                Some(p) => {
                    if p.side != side {
                        out.push(to);
                    }
                    break;
                }
            }
            cur = to.offset(dr, dc);
        }
    }
}

/// Slides like a rook onto empty squares; captures only by jumping exactly
/// one screen and landing on the first enemy piece beyond it.
pub fn cannon(board: &Board, sq: Square, side: Side, out: &mut Vec<Square>) {
    for (dr, dc) in ORTHOGONAL {
        let mut screened = false;
        let mut cur = sq.offset(dr, dc);
        while let Some(to) = cur {
            match (board.piece_at(to), screened) {
                (None, false) => out.push(to),
                (Some(_), false) => screened = true,
                (None, true) => {}
                (Some(p), true) => {
                    if p.side != side {
                        out.push(to);
                    }
                    break;
                }
            }
            cur = to.offset(dr, dc);
        }
    }
}

/// One step forward; after crossing the river, also one step sideways.
pub fn pawn(board: &Board, sq: Square, side: Side, out: &mut Vec<Square>) {
    let crossed = !side.owns_row(sq.row);
    let forward = sq.offset(side.forward(), 0);
    let sideways = if crossed {
        [sq.offset(0, -1), sq.offset(0, 1)]
    } else {
        [None, None]
    };
    for to in std::iter::once(forward).chain(sideways).flatten() {
        if can_land(board, to, side) {
            out.push(to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col)
    }

    fn place(board: &mut Board, at: (u8, u8), side: Side, kind: PieceKind) {
        board.set_piece(sq(at.0, at.1), Some(Piece::new(side, kind)));
    }

    fn sorted(mut v: Vec<Square>) -> Vec<Square> {
        v.sort();
        v
    }

    fn squares(list: &[(u8, u8)]) -> Vec<Square> {
        sorted(list.iter().map(|&(r, c)| sq(r, c)).collect())
    }

    #[test]
    fn kings_face_each_other_on_open_file() {
        let mut board = Board::empty();
        place(&mut board, (9, 4), Side::Red, PieceKind::King);
        place(&mut board, (0, 4), Side::Black, PieceKind::King);

        let red = sorted(board.legal_moves(sq(9, 4)));
        assert_eq!(red, squares(&[(0, 4), (8, 4), (9, 3), (9, 5)]));

        let black = sorted(board.legal_moves(sq(0, 4)));
        assert_eq!(black, squares(&[(0, 3), (0, 5), (1, 4), (9, 4)]));
    }

    #[test]
    fn flying_general_blocked_by_any_piece() {
        let mut board = Board::empty();
        place(&mut board, (9, 4), Side::Red, PieceKind::King);
        place(&mut board, (0, 4), Side::Black, PieceKind::King);
        place(&mut board, (5, 4), Side::Black, PieceKind::Pawn);
        assert!(!board.legal_moves(sq(9, 4)).contains(&sq(0, 4)));
    }

    #[test]
    fn king_stays_in_palace() {
        let mut board = Board::empty();
        place(&mut board, (7, 3), Side::Red, PieceKind::King);
        let moves = sorted(board.legal_moves(sq(7, 3)));
        assert_eq!(moves, squares(&[(7, 4), (8, 3)]));
    }

    #[test]
    fn advisors_from_start() {
        let mut board = Board::empty();
        place(&mut board, (0, 3), Side::Black, PieceKind::Advisor);
        place(&mut board, (0, 5), Side::Black, PieceKind::Advisor);
        place(&mut board, (9, 3), Side::Red, PieceKind::Advisor);
        place(&mut board, (9, 5), Side::Red, PieceKind::Advisor);
        assert_eq!(board.legal_moves(sq(0, 3)), vec![sq(1, 4)]);
        assert_eq!(board.legal_moves(sq(0, 5)), vec![sq(1, 4)]);
        assert_eq!(board.legal_moves(sq(9, 3)), vec![sq(8, 4)]);
        assert_eq!(board.legal_moves(sq(9, 5)), vec![sq(8, 4)]);
    }

    #[test]
    fn elephants_from_start() {
        let board = Board::new();
        assert_eq!(sorted(board.legal_moves(sq(0, 2))), squares(&[(2, 0), (2, 4)]));
        assert_eq!(sorted(board.legal_moves(sq(0, 6))), squares(&[(2, 4), (2, 8)]));
        assert_eq!(sorted(board.legal_moves(sq(9, 2))), squares(&[(7, 0), (7, 4)]));
        assert_eq!(sorted(board.legal_moves(sq(9, 6))), squares(&[(7, 4), (7, 8)]));
    }

    #[test]
    fn elephant_cannot_cross_river() {
        let mut board = Board::empty();
        place(&mut board, (5, 2), Side::Red, PieceKind::Elephant);
        let moves = sorted(board.legal_moves(sq(5, 2)));
        assert_eq!(moves, squares(&[(7, 0), (7, 4)]));
    }

    #[test]
    fn elephant_blocked_by_eye() {
        let mut board = Board::empty();
        place(&mut board, (9, 2), Side::Red, PieceKind::Elephant);
        place(&mut board, (8, 3), Side::Black, PieceKind::Pawn);
        assert_eq!(board.legal_moves(sq(9, 2)), vec![sq(7, 0)]);
    }

    #[test]
    fn knights_from_start() {
        let board = Board::new();
        assert_eq!(sorted(board.legal_moves(sq(0, 1))), squares(&[(2, 0), (2, 2)]));
        assert_eq!(sorted(board.legal_moves(sq(0, 7))), squares(&[(2, 6), (2, 8)]));
        assert_eq!(sorted(board.legal_moves(sq(9, 1))), squares(&[(7, 0), (7, 2)]));
        assert_eq!(sorted(board.legal_moves(sq(9, 7))), squares(&[(7, 6), (7, 8)]));
    }

    #[test]
    fn knight_leg_is_orthogonal_square() {
        let mut board = Board::empty();
        place(&mut board, (4, 4), Side::Red, PieceKind::Knight);
        assert_eq!(board.legal_moves(sq(4, 4)).len(), 8);

        // Leg above blocks both upward jumps only.
        place(&mut board, (3, 4), Side::Black, PieceKind::Pawn);
        let moves = board.legal_moves(sq(4, 4));
        assert_eq!(moves.len(), 6);
        assert!(!moves.contains(&sq(2, 3)));
        assert!(!moves.contains(&sq(2, 5)));

        // A diagonal neighbour does not block anything.
        place(&mut board, (5, 5), Side::Black, PieceKind::Pawn);
        assert_eq!(board.legal_moves(sq(4, 4)).len(), 6);
    }

    #[test]
    fn rooks_from_start() {
        let board = Board::new();
        assert_eq!(sorted(board.legal_moves(sq(0, 0))), squares(&[(1, 0), (2, 0)]));
        assert_eq!(sorted(board.legal_moves(sq(0, 8))), squares(&[(1, 8), (2, 8)]));
        assert_eq!(sorted(board.legal_moves(sq(9, 0))), squares(&[(7, 0), (8, 0)]));
        assert_eq!(sorted(board.legal_moves(sq(9, 8))), squares(&[(7, 8), (8, 8)]));
    }

    #[test]
    fn cannons_from_start() {
        let board = Board::new();
        let expected = squares(&[
            (1, 1), (2, 0), (2, 2), (2, 3), (2, 4), (2, 5), (2, 6),
            (3, 1), (4, 1), (5, 1), (6, 1), (9, 1),
        ]);
        assert_eq!(sorted(board.legal_moves(sq(2, 1))), expected);

        let expected = squares(&[
            (7, 2), (7, 3), (7, 4), (7, 5), (7, 6), (8, 1), (7, 0),
            (6, 1), (5, 1), (4, 1), (3, 1), (0, 1),
        ]);
        assert_eq!(sorted(board.legal_moves(sq(7, 1))), expected);
    }

    #[test]
    fn cannon_needs_exactly_one_screen() {
        let mut board = Board::empty();
        place(&mut board, (9, 0), Side::Red, PieceKind::Cannon);
        place(&mut board, (5, 0), Side::Black, PieceKind::Pawn);
        // No screen: the adjacent enemy cannot be captured.
        assert!(!board.legal_moves(sq(9, 0)).contains(&sq(5, 0)));

        place(&mut board, (2, 0), Side::Black, PieceKind::Rook);
        place(&mut board, (0, 0), Side::Black, PieceKind::Rook);
        let moves = board.legal_moves(sq(9, 0));
        // One screen: first enemy beyond it is capturable.
        assert!(moves.contains(&sq(2, 0)));
        // Two screens: illegal.
        assert!(!moves.contains(&sq(0, 0)));
        // Empty squares past the screen are not reachable.
        assert!(!moves.contains(&sq(4, 0)));
    }

    #[test]
    fn cannon_cannot_capture_own_piece_over_screen() {
        let mut board = Board::empty();
        place(&mut board, (9, 0), Side::Red, PieceKind::Cannon);
        place(&mut board, (8, 0), Side::Black, PieceKind::Pawn);
        place(&mut board, (6, 0), Side::Red, PieceKind::Rook);
        assert!(!board.legal_moves(sq(9, 0)).contains(&sq(6, 0)));
    }

    #[test]
    fn pawns_before_river_move_forward_only() {
        let board = Board::new();
        for col in (0..9).step_by(2) {
            assert_eq!(board.legal_moves(sq(3, col)), vec![sq(4, col)]);
            assert_eq!(board.legal_moves(sq(6, col)), vec![sq(5, col)]);
        }
    }

    #[test]
    fn pawn_after_river_moves_sideways() {
        let mut board = Board::empty();
        place(&mut board, (4, 4), Side::Red, PieceKind::Pawn);
        let moves = sorted(board.legal_moves(sq(4, 4)));
        assert_eq!(moves, squares(&[(3, 4), (4, 3), (4, 5)]));

        place(&mut board, (5, 0), Side::Black, PieceKind::Pawn);
        let moves = sorted(board.legal_moves(sq(5, 0)));
        assert_eq!(moves, squares(&[(5, 1), (6, 0)]));
    }

    #[test]
    fn pawn_on_last_rank_only_moves_sideways() {
        let mut board = Board::empty();
        place(&mut board, (0, 4), Side::Red, PieceKind::Pawn);
        let moves = sorted(board.legal_moves(sq(0, 4)));
        assert_eq!(moves, squares(&[(0, 3), (0, 5)]));
    }
}
