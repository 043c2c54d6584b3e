//! Game state representation.
//!
//! Holds the complete snapshot of a Xiangqi game: the 10x9 grid, side to
//! move, the inactivity counter that drives the draw rule, and the terminal
//! flag with its winner.

use std::ops::Deref;

use super::piece::{Move, Piece, PieceKind, Side, Square, COLS, ROWS};
use crate::movegen;

/// Default number of consecutive non-capturing plies that ends the game in a draw.
pub const DEFAULT_DRAW_LIMIT: u16 = 60;

/// Errors raised when a move request is rejected. The board is unchanged on error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("no piece on {0}")]
    NoPiece(Square),

    #[error("piece on {0} does not belong to the side to move")]
    WrongSide(Square),

    #[error("illegal move {0}")]
    IllegalMove(Move),

    #[error("game is already over")]
    GameOver,
}

/// Complete board state at a point in time.
///
/// Cells are a fixed-size grid indexed `[row][col]`, so the state is cheap to
/// clone when a search tree needs an independent snapshot per node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Piece>; COLS]; ROWS],
    side_to_move: Side,
    plies_since_capture: u16,
    terminal: bool,
    winner: Option<Side>,
    draw_limit: u16,
}

/// Back-rank layout shared by both sides, from column 0 to 8.
const BACK_RANK: [PieceKind; COLS] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Elephant,
    PieceKind::Advisor,
    PieceKind::King,
    PieceKind::Advisor,
    PieceKind::Elephant,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    /// Creates the standard opening position with red to move.
    pub fn new() -> Self {
        let mut board = Board::empty();
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            board.cells[0][col] = Some(Piece::new(Side::Black, kind));
            board.cells[9][col] = Some(Piece::new(Side::Red, kind));
        }
        for col in [1, 7] {
            board.cells[2][col] = Some(Piece::new(Side::Black, PieceKind::Cannon));
            board.cells[7][col] = Some(Piece::new(Side::Red, PieceKind::Cannon));
        }
        for col in (0..COLS).step_by(2) {
            board.cells[3][col] = Some(Piece::new(Side::Black, PieceKind::Pawn));
            board.cells[6][col] = Some(Piece::new(Side::Red, PieceKind::Pawn));
        }
        board
    }

    /// Creates a board with no pieces, red to move.
    pub fn empty() -> Self {
        Board {
            cells: [[None; COLS]; ROWS],
            side_to_move: Side::Red,
            plies_since_capture: 0,
            terminal: false,
            winner: None,
            draw_limit: DEFAULT_DRAW_LIMIT,
        }
    }

    /// Sets the inactivity threshold for the draw rule.
    pub fn with_draw_limit(mut self, limit: u16) -> Self {
        self.draw_limit = limit;
        self
    }

    pub fn draw_limit(&self) -> u16 {
        self.draw_limit
    }

    /// Read-only access to the grid, row 0 being black's back rank.
    pub fn cells(&self) -> &[[Option<Piece>; COLS]; ROWS] {
        &self.cells
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.row as usize][sq.col as usize]
    }

    /// Places (or clears) a piece. Intended for position setup.
    pub fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.row as usize][sq.col as usize] = piece;
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn set_side_to_move(&mut self, side: Side) {
        self.side_to_move = side;
    }

    pub fn plies_since_capture(&self) -> u16 {
        self.plies_since_capture
    }

    pub fn set_plies_since_capture(&mut self, plies: u16) {
        self.plies_since_capture = plies;
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// The winning side, set only when the game ended by king capture,
    /// checkmate, or a side running out of moves.
    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Iterates over all pieces of `side` with their squares, row-major.
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (0..ROWS * COLS).filter_map(move |i| {
            let sq = Square::from_index(i);
            match self.piece_at(sq) {
                Some(p) if p.side == side => Some((sq, p)),
                _ => None,
            }
        })
    }

    /// Locates `side`'s king, if it is still on the board.
    pub fn king_square(&self, side: Side) -> Option<Square> {
        self.pieces(side)
            .find(|(_, p)| p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Destinations for the piece on `sq`. Not filtered for self-check.
    pub fn legal_moves(&self, sq: Square) -> Vec<Square> {
        movegen::legal_moves(self, sq)
    }

    /// All moves of the side to move. Not filtered for self-check.
    pub fn all_moves(&self) -> Vec<Move> {
        movegen::all_moves(self, self.side_to_move)
    }

    /// Checks that the piece on `mv.from` belongs to the side to move and
    /// that `mv.to` is among its destinations. Returns the moving piece.
    pub fn validate(&self, mv: Move) -> Result<Piece, BoardError> {
        let piece = self.piece_at(mv.from).ok_or(BoardError::NoPiece(mv.from))?;
        if piece.side != self.side_to_move {
            return Err(BoardError::WrongSide(mv.from));
        }
        if !movegen::legal_moves(self, mv.from).contains(&mv.to) {
            return Err(BoardError::IllegalMove(mv));
        }
        Ok(piece)
    }

    /// Plays a move for the side to move.
    ///
    /// Returns the captured piece, if any. Capturing a king ends the game
    /// immediately; reaching the inactivity limit ends it in a draw.
    /// Checkmate is not detected here, call [`Board::game_over`] for that.
    pub fn apply_move(&mut self, mv: Move) -> Result<Option<Piece>, BoardError> {
        if self.terminal {
            return Err(BoardError::GameOver);
        }
        self.validate(mv)?;
        Ok(self.commit_move(mv))
    }

    /// Applies an already-validated move with full bookkeeping.
    pub(crate) fn commit_move(&mut self, mv: Move) -> Option<Piece> {
        let mover = self.side_to_move;
        let piece = self.piece_at(mv.from);
        let captured = self.piece_at(mv.to);
        self.set_piece(mv.to, piece);
        self.set_piece(mv.from, None);
        self.side_to_move = mover.opponent();

        match captured {
            Some(_) => self.plies_since_capture = 0,
            None => self.plies_since_capture = self.plies_since_capture.saturating_add(1),
        }

        if matches!(captured, Some(p) if p.kind == PieceKind::King) {
            self.terminal = true;
            self.winner = Some(mover);
        } else if self.is_draw() {
            self.terminal = true;
        }
        captured
    }

    /// Tentatively relocates a piece without any bookkeeping. The returned
    /// guard restores both squares when dropped, on every exit path.
    pub fn trial_move(&mut self, mv: Move) -> TrialMove<'_> {
        let moved = self.piece_at(mv.from);
        let captured = self.piece_at(mv.to);
        self.set_piece(mv.to, moved);
        self.set_piece(mv.from, None);
        TrialMove {
            board: self,
            mv,
            moved,
            captured,
        }
    }

    /// True iff some enemy piece can move onto `side`'s king.
    pub fn is_in_check(&self, side: Side) -> bool {
        let king = match self.king_square(side) {
            Some(sq) => sq,
            None => return false,
        };
        let mut buf = Vec::with_capacity(17);
        self.pieces(side.opponent()).any(|(sq, _)| {
            buf.clear();
            movegen::destinations_into(self, sq, &mut buf);
            buf.contains(&king)
        })
    }

    /// True iff the side to move is in check and every one of its moves
    /// still leaves it in check.
    pub fn is_checkmate(&mut self) -> bool {
        let side = self.side_to_move;
        if !self.is_in_check(side) {
            return false;
        }
        for mv in movegen::all_moves(self, side) {
            let trial = self.trial_move(mv);
            if !trial.is_in_check(side) {
                return false;
            }
        }
        true
    }

    /// True iff the inactivity counter has reached the draw limit.
    pub fn is_draw(&self) -> bool {
        self.plies_since_capture >= self.draw_limit
    }

    /// Evaluates and records the end of the game.
    ///
    /// A side to move with no move at all, or in checkmate, loses.
    pub fn game_over(&mut self) -> bool {
        if self.terminal {
            return true;
        }
        if self.is_draw() {
            self.terminal = true;
            return true;
        }
        let side = self.side_to_move;
        if movegen::all_moves(self, side).is_empty() || self.is_checkmate() {
            self.terminal = true;
            self.winner = Some(side.opponent());
            return true;
        }
        false
    }

    /// Final reward from red's perspective: +1 red win, -1 black win, 0 draw.
    /// None while the game is still running.
    pub fn reward(&self) -> Option<f32> {
        if !self.terminal {
            return None;
        }
        Some(self.winner.map_or(0.0, Side::sign))
    }

    /// Every (child board, move) pair reachable by one move of the side to move.
    pub fn successors(&self) -> Vec<(Board, Move)> {
        movegen::all_moves(self, self.side_to_move)
            .into_iter()
            .map(|mv| {
                let mut child = self.clone();
                child.commit_move(mv);
                (child, mv)
            })
            .collect()
    }
}

/// Scoped trial move produced by [`Board::trial_move`].
pub struct TrialMove<'a> {
    board: &'a mut Board,
    mv: Move,
    moved: Option<Piece>,
    captured: Option<Piece>,
}

impl Deref for TrialMove<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl Drop for TrialMove<'_> {
    fn drop(&mut self) {
        self.board.set_piece(self.mv.from, self.moved);
        self.board.set_piece(self.mv.to, self.captured);
    }
}
