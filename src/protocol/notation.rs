//! Text notation for boards, positions and moves.
//!
//! A board is 90 characters, row-major from black's back rank: `_` for an
//! empty square, uppercase for red, lowercase for black, with letters
//! `k a b n r c p`. A position appends the side to move and the number of
//! plies since the last capture:
//!
//! `rnbakabnr__________c_____c_p_p_p_p_p__________________P_P_P_P_P_C_____C__________RNBAKABNR r 0`
//!
//! Moves use coordinate notation (`h2e2`): file letter, then rank digit
//! counted from red's back rank.

use crate::board::{Board, Move, Piece, Side, Square, COLS, ROWS, SQUARE_COUNT};

/// Errors that can occur while parsing notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("expected 90 board characters, got {0}")]
    WrongCellCount(usize),

    #[error("invalid piece character: '{0}'")]
    InvalidPiece(char),

    #[error("expected 3 fields separated by spaces, got {0}")]
    WrongFieldCount(usize),

    #[error("invalid side to move: '{0}'")]
    InvalidSide(String),

    #[error("invalid ply counter: '{0}'")]
    InvalidPlies(String),

    #[error("invalid move: '{0}'")]
    InvalidMove(String),
}

const EMPTY: char = '_';

/// The standard opening position, red to move.
pub const INITIAL: &str =
    "rnbakabnr__________c_____c_p_p_p_p_p__________________P_P_P_P_P_C_____C__________RNBAKABNR r 0";

/// Encodes the grid of `board`.
pub fn encode_board(board: &Board) -> String {
    let mut out = String::with_capacity(SQUARE_COUNT);
    for row in board.cells() {
        for cell in row {
            out.push(cell.map_or(EMPTY, Piece::notation_char));
        }
    }
    out
}

/// Parses a grid into a board with red to move and a zero capture counter.
pub fn parse_board(s: &str) -> Result<Board, NotationError> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() != SQUARE_COUNT {
        return Err(NotationError::WrongCellCount(chars.len()));
    }
    let mut board = Board::empty();
    for (i, &c) in chars.iter().enumerate() {
        if c == EMPTY {
            continue;
        }
        let piece = Piece::from_notation_char(c).ok_or(NotationError::InvalidPiece(c))?;
        board.set_piece(Square::from_index(i), Some(piece));
    }
    Ok(board)
}

/// Encodes a full position.
pub fn encode_position(board: &Board) -> String {
    format!(
        "{} {} {}",
        encode_board(board),
        board.side_to_move().notation_char(),
        board.plies_since_capture()
    )
}

/// Parses a full position. The end-of-game state is not evaluated; call
/// [`Board::game_over`] on the result if needed.
pub fn parse_position(s: &str) -> Result<Board, NotationError> {
    let fields: Vec<&str> = s.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(NotationError::WrongFieldCount(fields.len()));
    }
    let mut board = parse_board(fields[0])?;

    let mut side_chars = fields[1].chars();
    let side = match (side_chars.next(), side_chars.next()) {
        (Some(c), None) => Side::from_notation_char(c),
        _ => None,
    }
    .ok_or_else(|| NotationError::InvalidSide(fields[1].to_string()))?;
    board.set_side_to_move(side);

    let plies = fields[2]
        .parse::<u16>()
        .map_err(|_| NotationError::InvalidPlies(fields[2].to_string()))?;
    board.set_plies_since_capture(plies);
    Ok(board)
}

/// Parses a coordinate move such as `h2e2`.
pub fn parse_move(s: &str) -> Result<Move, NotationError> {
    Move::from_notation(s.trim()).ok_or_else(|| NotationError::InvalidMove(s.to_string()))
}

/// Renders the board as a 10-line diagram with rank digits and file letters.
pub fn diagram(board: &Board) -> String {
    let mut out = String::with_capacity((COLS + 3) * (ROWS + 1));
    for (row, cells) in board.cells().iter().enumerate() {
        out.push((b'0' + (ROWS - 1 - row) as u8) as char);
        out.push(' ');
        for cell in cells {
            out.push(cell.map_or('.', Piece::notation_char));
        }
        out.push('\n');
    }
    out.push_str("  abcdefghi\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceKind;

    #[test]
    fn encode_initial_position() {
        assert_eq!(encode_position(&Board::new()), INITIAL);
    }

    #[test]
    fn parse_initial_position() {
        let board = parse_position(INITIAL).expect("failed to parse initial position");
        assert_eq!(board, Board::new());
    }

    #[test]
    fn roundtrip_after_moves() {
        let mut board = Board::new();
        for text in ["h2e2", "h9g7", "e2e6"] {
            board.apply_move(parse_move(text).unwrap()).unwrap();
        }
        let encoded = encode_position(&board);
        assert!(encoded.ends_with(" b 0"), "capture resets the counter: {}", encoded);
        let parsed = parse_position(&encoded).unwrap();
        assert_eq!(parsed, board);
    }

    #[test]
    fn parse_board_places_pieces() {
        let board = parse_board(INITIAL.split(' ').next().unwrap()).unwrap();
        assert_eq!(
            board.piece_at(Square::new(7, 1)),
            Some(Piece::new(Side::Red, PieceKind::Cannon))
        );
        assert_eq!(
            board.piece_at(Square::new(0, 4)),
            Some(Piece::new(Side::Black, PieceKind::King))
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_board("rnb"), Err(NotationError::WrongCellCount(3)));
        let bad_piece = INITIAL.replacen('r', "x", 1);
        assert_eq!(parse_position(&bad_piece), Err(NotationError::InvalidPiece('x')));
        assert_eq!(
            parse_position("rnbakabnr r"),
            Err(NotationError::WrongFieldCount(2))
        );
        let bad_side = INITIAL.replace(" r 0", " x 0");
        assert_eq!(
            parse_position(&bad_side),
            Err(NotationError::InvalidSide("x".to_string()))
        );
        let bad_plies = INITIAL.replace(" r 0", " r many");
        assert_eq!(
            parse_position(&bad_plies),
            Err(NotationError::InvalidPlies("many".to_string()))
        );
        assert_eq!(parse_move("z9z9"), Err(NotationError::InvalidMove("z9z9".to_string())));
    }

    #[test]
    fn diagram_shows_ranks() {
        let text = diagram(&Board::new());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "9 rnbakabnr");
        assert_eq!(lines[9], "0 RNBAKABNR");
        assert_eq!(lines[10], "  abcdefghi");
    }
}
