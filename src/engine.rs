//! Engine state management.
//!
//! Holds the current game (as the root of the search tree), the moves played
//! so far, and engine options. Searching returns a move; playing a move
//! re-roots the tree so statistics carry over to the next search.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use crate::board::{Board, BoardError, Move, Piece};
use crate::protocol::{parse_position, NotationError};
use crate::search::{ChildStats, LeafPolicy, Mcts, MctsConfig, SearchError};

/// Errors surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to parse position: {0}")]
    Notation(#[from] NotationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("illegal move: {0}")]
    Board(#[from] BoardError),

    #[error("invalid value '{value}' for option {name}")]
    InvalidOption { name: String, value: String },
}

/// Holds the mutable state of the engine between moves.
pub struct Engine<P> {
    mcts: Mcts<P>,
    history: Vec<Move>,
    options: HashMap<String, String>,
}

impl<P: LeafPolicy> Engine<P> {
    /// Creates an engine at the standard opening position.
    pub fn new(policy: P, config: MctsConfig) -> Self {
        Engine {
            mcts: Mcts::new(Board::new(), policy, config),
            history: Vec::new(),
            options: HashMap::new(),
        }
    }

    /// Seeds the search's random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.mcts = self.mcts.with_seed(seed);
        self
    }

    /// The current position.
    pub fn board(&self) -> &Board {
        self.mcts.root_board()
    }

    /// Moves played since the game or position was set.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn config(&self) -> &MctsConfig {
        self.mcts.config()
    }

    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }

    pub fn mcts(&self) -> &Mcts<P> {
        &self.mcts
    }

    /// Resets to the opening position and drops the tree.
    pub fn new_game(&mut self) {
        self.set_board(Board::new());
    }

    /// Replaces the current position and drops the tree.
    pub fn set_board(&mut self, board: Board) {
        self.mcts.reset(board);
        self.history.clear();
    }

    /// Sets the current position from text notation.
    pub fn set_position(&mut self, text: &str) -> Result<(), EngineError> {
        let board = parse_position(text)?;
        self.set_board(board);
        Ok(())
    }

    /// Sets an engine option. Recognized names are `Passes`, `Threads`,
    /// `Exploration`, `VirtualLoss` and `TimeBudgetMs` (0 clears the budget);
    /// other names are stored and ignored. The value is validated before it is stored.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        let invalid = || EngineError::InvalidOption {
            name: name.to_string(),
            value: value.to_string(),
        };
        let mut config = self.mcts.config().clone();
        match name {
            "Passes" => config.passes = value.parse().map_err(|_| invalid())?,
            "Threads" => {
                let threads: usize = value.parse().map_err(|_| invalid())?;
                config = config.with_threads(threads);
            }
            "Exploration" => {
                let c: f32 = value.parse().map_err(|_| invalid())?;
                if !c.is_finite() || c < 0.0 {
                    return Err(invalid());
                }
                config.exploration = c;
            }
            "VirtualLoss" => {
                let weight: f32 = value.parse().map_err(|_| invalid())?;
                if !weight.is_finite() || weight < 0.0 {
                    return Err(invalid());
                }
                config = config.with_virtual_loss(weight);
            }
            "TimeBudgetMs" => {
                let ms: u64 = value.parse().map_err(|_| invalid())?;
                config.time_budget = (ms > 0).then(|| Duration::from_millis(ms));
            }
            _ => debug!(name, "storing unrecognized option"),
        }
        self.mcts.set_config(config);
        self.options.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Searches the current position. `Ok(None)` when the game is over.
    pub fn go(&mut self) -> Result<Option<Move>, EngineError> {
        if self.board().is_terminal() {
            return Ok(None);
        }
        let best = self.mcts.search_best()?;
        if let Some(mv) = best {
            info!(ply = self.history.len(), %mv, visits = self.mcts.root().visits(), "bestmove");
        }
        Ok(best)
    }

    /// Plays a move in the current position, reusing its subtree. Returns
    /// the captured piece, if any.
    pub fn play(&mut self, mv: Move) -> Result<Option<Piece>, EngineError> {
        if self.board().is_terminal() {
            return Err(BoardError::GameOver.into());
        }
        self.board().validate(mv)?;
        let captured = self.board().piece_at(mv.to);
        self.mcts.advance(mv)?;
        self.history.push(mv);
        Ok(captured)
    }

    /// Searches, then plays the chosen move.
    pub fn go_and_play(&mut self) -> Result<Option<Move>, EngineError> {
        let best = self.go()?;
        if let Some(mv) = best {
            self.play(mv)?;
        }
        Ok(best)
    }

    /// Root statistics from the last search.
    pub fn root_stats(&self) -> Vec<ChildStats> {
        self.mcts.root_stats()
    }

    /// Whether the current position is finished. End-of-game rules are
    /// evaluated whenever a position becomes the search root.
    pub fn is_game_over(&self) -> bool {
        self.board().is_terminal()
    }
}
