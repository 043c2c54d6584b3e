//! Move label enumeration.
//!
//! Every geometrically possible move gets a fixed index into the policy
//! vector. For each source square (file-major, then rank 0..9) the table
//! lists same-rank destinations, same-file destinations, then the eight
//! knight jumps; the 16 advisor diagonals and 32 elephant diagonals follow
//! as fixed lists since the generic scan never produces them.
//!
//! The table is built once on first use and never mutated.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::board::{Move, Square, COLS, ROWS};

/// Total number of move labels.
pub const NUM_LABELS: usize = 2086;

/// Knight offsets as (file delta, rank delta), in table order.
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-1, -2),
    (-2, 1),
    (1, -2),
    (2, -1),
    (-1, 2),
    (2, 1),
    (1, 2),
];

const ADVISOR_LABELS: [&str; 16] = [
    "d7e8", "e8d7", "e8f9", "f9e8", "d0e1", "e1d0", "e1f2", "f2e1", "d2e1", "e1d2", "e1f0", "f0e1",
    "d9e8", "e8d9", "e8f7", "f7e8",
];

const ELEPHANT_LABELS: [&str; 32] = [
    "a2c4", "c4a2", "c0e2", "e2c0", "e2g4", "g4e2", "g0i2", "i2g0", "a7c9", "c9a7", "c5e7", "e7c5",
    "e7g9", "g9e7", "g5i7", "i7g5", "a2c0", "c0a2", "c4e2", "e2c4", "e2g0", "g0e2", "g4i2", "i2g4",
    "a7c5", "c5a7", "c9e7", "e7c9", "e7g5", "g5e7", "g9i7", "i7g9",
];

/// A move was looked up that the label table does not contain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("move {0} has no policy label")]
    UnknownMoveLabel(Move),
}

struct LabelTable {
    moves: Vec<Move>,
    index: HashMap<Move, usize>,
}

static LABELS: Lazy<LabelTable> = Lazy::new(build_table);

/// Square from (file, rank) with rank 0 on red's back rank.
fn square_at(file: i8, rank: i8) -> Option<Square> {
    if (0..COLS as i8).contains(&file) && (0..ROWS as i8).contains(&rank) {
        Some(Square::new((ROWS as i8 - 1 - rank) as u8, file as u8))
    } else {
        None
    }
}

fn build_table() -> LabelTable {
    let mut moves = Vec::with_capacity(NUM_LABELS);

    for file in 0..COLS as i8 {
        for rank in 0..ROWS as i8 {
            let Some(from) = square_at(file, rank) else {
                continue;
            };
            let along_rank = (0..COLS as i8).map(|f| (f, rank));
            let along_file = (0..ROWS as i8).map(|r| (file, r));
            let jumps = KNIGHT_OFFSETS.iter().map(|&(df, dr)| (file + df, rank + dr));
            for (f, r) in along_rank.chain(along_file).chain(jumps) {
                if (f, r) == (file, rank) {
                    continue;
                }
                if let Some(to) = square_at(f, r) {
                    moves.push(Move::new(from, to));
                }
            }
        }
    }

    moves.extend(
        ADVISOR_LABELS
            .iter()
            .chain(ELEPHANT_LABELS.iter())
            .filter_map(|s| Move::from_notation(s)),
    );

    let index = moves.iter().enumerate().map(|(i, &mv)| (mv, i)).collect();
    LabelTable { moves, index }
}

/// Policy index of `mv`.
pub fn label_index(mv: Move) -> Result<usize, LabelError> {
    LABELS
        .index
        .get(&mv)
        .copied()
        .ok_or(LabelError::UnknownMoveLabel(mv))
}

/// Move at policy index `index`, if in range.
pub fn label_move(index: usize) -> Option<Move> {
    LABELS.moves.get(index).copied()
}
