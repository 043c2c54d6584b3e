//! Piece, square, and move primitives.
//!
//! Squares are addressed by `(row, col)` with row 0 on black's back rank and
//! row 9 on red's back rank. Red occupies rows 5..=9, black rows 0..=4.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of rows (ranks) on the board.
pub const ROWS: usize = 10;

/// Number of columns (files) on the board.
pub const COLS: usize = 9;

/// Number of squares on the board.
pub const SQUARE_COUNT: usize = ROWS * COLS;

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    Black,
}

impl Side {
    /// Returns the other side.
    pub const fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    /// +1 for red, -1 for black. Scores are kept from red's perspective.
    pub const fn sign(self) -> f32 {
        match self {
            Side::Red => 1.0,
            Side::Black => -1.0,
        }
    }

    /// Returns the single-character notation abbreviation.
    pub const fn notation_char(self) -> char {
        match self {
            Side::Red => 'r',
            Side::Black => 'b',
        }
    }

    /// Parses a side from its single-character notation abbreviation.
    pub fn from_notation_char(c: char) -> Option<Side> {
        match c {
            'r' => Some(Side::Red),
            'b' => Some(Side::Black),
            _ => None,
        }
    }

    /// Whether `row` lies on this side's half of the board.
    pub const fn owns_row(self, row: u8) -> bool {
        match self {
            Side::Red => row >= 5,
            Side::Black => row <= 4,
        }
    }

    /// Row direction of a forward step for this side's pawns.
    pub const fn forward(self) -> i8 {
        match self {
            Side::Red => -1,
            Side::Black => 1,
        }
    }
}

/// The kind of a piece, independent of side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Advisor,
    Elephant,
    Knight,
    Rook,
    Cannon,
    Pawn,
}

impl PieceKind {
    /// Lowercase notation letter (`k a b n r c p`).
    pub const fn notation_char(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Advisor => 'a',
            PieceKind::Elephant => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Rook => 'r',
            PieceKind::Cannon => 'c',
            PieceKind::Pawn => 'p',
        }
    }

    /// Parses a kind from its lowercase notation letter.
    pub fn from_notation_char(c: char) -> Option<PieceKind> {
        match c {
            'k' => Some(PieceKind::King),
            'a' => Some(PieceKind::Advisor),
            'b' => Some(PieceKind::Elephant),
            'n' => Some(PieceKind::Knight),
            'r' => Some(PieceKind::Rook),
            'c' => Some(PieceKind::Cannon),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

/// A piece on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Piece { side, kind }
    }

    /// Notation letter: uppercase for red, lowercase for black.
    pub fn notation_char(self) -> char {
        let c = self.kind.notation_char();
        match self.side {
            Side::Red => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }

    /// Parses a piece from its notation letter.
    pub fn from_notation_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_notation_char(c.to_ascii_lowercase())?;
        let side = if c.is_ascii_uppercase() { Side::Red } else { Side::Black };
        Some(Piece { side, kind })
    }
}

/// A board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub const fn new(row: u8, col: u8) -> Self {
        Square { row, col }
    }

    /// Returns the square offset by `(dr, dc)`, or None when off the board.
    #[inline]
    pub fn offset(self, dr: i8, dc: i8) -> Option<Square> {
        let r = self.row as i8 + dr;
        let c = self.col as i8 + dc;
        if (0..ROWS as i8).contains(&r) && (0..COLS as i8).contains(&c) {
            Some(Square::new(r as u8, c as u8))
        } else {
            None
        }
    }

    /// Row-major index in 0..90.
    #[inline]
    pub const fn index(self) -> usize {
        self.row as usize * COLS + self.col as usize
    }

    /// Inverse of [`Square::index`].
    pub const fn from_index(index: usize) -> Square {
        Square::new((index / COLS) as u8, (index % COLS) as u8)
    }

    /// Whether the square lies inside `side`'s palace.
    pub const fn in_palace(self, side: Side) -> bool {
        let rows_ok = match side {
            Side::Red => self.row >= 7,
            Side::Black => self.row <= 2,
        };
        rows_ok && self.col >= 3 && self.col <= 5
    }

    /// Coordinate notation, e.g. `e0` for red's king square.
    pub fn notation(self) -> String {
        let file = (b'a' + self.col) as char;
        let rank = (b'0' + (ROWS as u8 - 1 - self.row)) as char;
        format!("{}{}", file, rank)
    }

    /// Parses coordinate notation.
    pub fn from_notation(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='i').contains(&file) || !rank.is_ascii_digit() {
            return None;
        }
        let col = file as u8 - b'a';
        let row = ROWS as u8 - 1 - (rank as u8 - b'0');
        Some(Square::new(row, col))
    }
}

/// A move from one square to another, evaluated against the board that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Self {
        Move { from, to }
    }

    /// Coordinate notation, e.g. `h2e2`.
    pub fn notation(self) -> String {
        format!("{}{}", self.from.notation(), self.to.notation())
    }

    /// Parses coordinate notation.
    pub fn from_notation(s: &str) -> Option<Move> {
        if s.len() != 4 || !s.is_ascii() {
            return None;
        }
        let from = Square::from_notation(&s[..2])?;
        let to = Square::from_notation(&s[2..])?;
        Some(Move { from, to })
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.notation())
    }
}

/// Moves serialize as their coordinate notation.
impl Serialize for Move {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.notation())
    }
}

impl<'de> Deserialize<'de> for Move {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Move::from_notation(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid move '{}'", s)))
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.notation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_notation_roundtrip() {
        for s in [Side::Red, Side::Black] {
            assert_eq!(Side::from_notation_char(s.notation_char()), Some(s));
        }
        assert_eq!(Side::from_notation_char('x'), None);
    }

    #[test]
    fn piece_letters_follow_case() {
        let red_rook = Piece::new(Side::Red, PieceKind::Rook);
        assert_eq!(red_rook.notation_char(), 'R');
        assert_eq!(Piece::from_notation_char('c'), Some(Piece::new(Side::Black, PieceKind::Cannon)));
        assert_eq!(Piece::from_notation_char('x'), None);
    }

    #[test]
    fn square_notation_uses_flipped_rank() {
        assert_eq!(Square::new(0, 4).notation(), "e9");
        assert_eq!(Square::new(9, 4).notation(), "e0");
        assert_eq!(Square::from_notation("a6"), Some(Square::new(3, 0)));
        assert_eq!(Square::from_notation("j1"), None);
    }

    #[test]
    fn move_notation_matches_coordinate_labels() {
        let cases = [
            (Square::new(0, 4), Square::new(1, 4), "e9e8"),
            (Square::new(0, 0), Square::new(0, 1), "a9b9"),
            (Square::new(0, 1), Square::new(2, 2), "b9c7"),
            (Square::new(2, 1), Square::new(5, 1), "b7b4"),
            (Square::new(3, 0), Square::new(4, 0), "a6a5"),
        ];
        for (from, to, text) in cases {
            let mv = Move::new(from, to);
            assert_eq!(mv.notation(), text);
            assert_eq!(Move::from_notation(text), Some(mv));
        }
    }

    #[test]
    fn move_serializes_as_notation() {
        let mv = Move::new(Square::new(7, 7), Square::new(7, 4));
        assert_eq!(serde_json::to_string(&mv).unwrap(), "\"h2e2\"");
        let back: Move = serde_json::from_str("\"h2e2\"").unwrap();
        assert_eq!(back, mv);
        assert!(serde_json::from_str::<Move>("\"zz\"").is_err());
    }

    #[test]
    fn offset_rejects_off_board() {
        assert_eq!(Square::new(0, 0).offset(-1, 0), None);
        assert_eq!(Square::new(9, 8).offset(0, 1), None);
        assert_eq!(Square::new(4, 4).offset(1, -1), Some(Square::new(5, 3)));
    }

    #[test]
    fn palace_bounds() {
        assert!(Square::new(9, 4).in_palace(Side::Red));
        assert!(Square::new(7, 3).in_palace(Side::Red));
        assert!(!Square::new(6, 4).in_palace(Side::Red));
        assert!(Square::new(2, 5).in_palace(Side::Black));
        assert!(!Square::new(1, 6).in_palace(Side::Black));
    }
}
