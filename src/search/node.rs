//! MCTS tree node representation.
//!
//! Each node owns the board reached by playing `mv` from its parent. Visit
//! statistics sit behind a per-node mutex. Expansion is serialized by a
//! second mutex, so reading statistics never waits on an evaluator call.
//! Children are attached exactly once and are immutable afterwards, so
//! concurrent selectors can read them without taking either lock.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::board::{Board, Move, Side};

/// Mutable statistics of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStats {
    /// Completed visits.
    pub visits: u32,

    /// Sum of backed-up values, from red's perspective. While unvisited,
    /// holds the provisional value the node was seeded with.
    pub score: f32,

    /// Passes currently in flight through this node.
    pub virtual_loss: u32,
}

impl NodeStats {
    /// Mean score from red's perspective, 0 when unvisited.
    #[inline]
    pub fn mean(&self) -> f32 {
        if self.visits == 0 {
            0.0
        } else {
            self.score / self.visits as f32
        }
    }
}

/// A node in the search tree.
#[derive(Debug)]
pub struct SearchNode {
    board: Board,
    mv: Option<Move>,
    prior: f32,
    terminal: bool,
    stats: Mutex<NodeStats>,
    expansion: Mutex<()>,
    children: OnceLock<Vec<Arc<SearchNode>>>,
}

impl SearchNode {
    /// Creates a node for `board`, reached by `mv` (None for a fresh root).
    /// Evaluates the end-of-game rules immediately.
    pub fn new(board: Board, mv: Option<Move>, prior: f32) -> Self {
        Self::with_score(board, mv, prior, 0.0)
    }

    /// Creates a node seeded with the provisional value `score`. The first
    /// recorded visit replaces it.
    pub fn with_score(mut board: Board, mv: Option<Move>, prior: f32, score: f32) -> Self {
        let terminal = board.game_over();
        SearchNode {
            board,
            mv,
            prior,
            terminal,
            stats: Mutex::new(NodeStats {
                score,
                ..NodeStats::default()
            }),
            expansion: Mutex::new(()),
            children: OnceLock::new(),
        }
    }

    /// Creates a root node for `board`.
    pub fn root(board: Board) -> Self {
        Self::new(board, None, 1.0)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The move that produced this node's board.
    pub fn mv(&self) -> Option<Move> {
        self.mv
    }

    pub fn prior(&self) -> f32 {
        self.prior
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// The side that chose the move leading here.
    pub fn mover(&self) -> Side {
        self.board.side_to_move().opponent()
    }

    /// Whether the node has had its children attached.
    pub fn is_expanded(&self) -> bool {
        self.children.get().is_some()
    }

    /// Terminal nodes count as fully expanded: they can have no children.
    pub fn is_fully_expanded(&self) -> bool {
        self.terminal || self.is_expanded()
    }

    /// Attached children, empty while unexpanded.
    pub fn children(&self) -> &[Arc<SearchNode>] {
        self.children.get().map_or(&[], Vec::as_slice)
    }

    /// Finds the child reached by `mv`.
    pub fn child(&self, mv: Move) -> Option<&Arc<SearchNode>> {
        self.children().iter().find(|c| c.mv == Some(mv))
    }

    /// Attaches children. Returns false if the node was already expanded,
    /// in which case `children` is discarded.
    pub(crate) fn set_children(&self, children: Vec<Arc<SearchNode>>) -> bool {
        self.children.set(children).is_ok()
    }

    /// Locks the statistics. A poisoned lock is recovered: every update
    /// under it is a single field write.
    pub fn lock_stats(&self) -> MutexGuard<'_, NodeStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serializes expansion of this node. Independent of the stats lock.
    pub(crate) fn lock_expansion(&self) -> MutexGuard<'_, ()> {
        self.expansion.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the statistics.
    pub fn stats(&self) -> NodeStats {
        *self.lock_stats()
    }

    pub fn visits(&self) -> u32 {
        self.lock_stats().visits
    }

    pub(crate) fn add_virtual_loss(&self) {
        self.lock_stats().virtual_loss += 1;
    }

    pub(crate) fn release_virtual_loss(&self) {
        let mut stats = self.lock_stats();
        stats.virtual_loss = stats.virtual_loss.saturating_sub(1);
    }

    /// Records one completed visit backing up `value`. The first visit
    /// replaces the seeded score, so the mean is always the average of the
    /// values backed up through this node.
    pub(crate) fn record_visit(&self, value: f32, in_flight: bool) {
        let mut stats = self.lock_stats();
        if stats.visits == 0 {
            stats.score = value;
        } else {
            stats.score += value;
        }
        stats.visits += 1;
        if in_flight {
            stats.virtual_loss = stats.virtual_loss.saturating_sub(1);
        }
    }

    /// Number of nodes in the subtree rooted here, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self.children().iter().map(|c| c.subtree_size()).sum::<usize>()
    }

    /// Visits every node of the subtree, depth first.
    pub fn for_each(&self, f: &mut impl FnMut(&SearchNode)) {
        f(self);
        for child in self.children() {
            child.for_each(f);
        }
    }
}
