//! Monte-Carlo Tree Search over a shared tree.
//!
//! One pass is select -> expand -> (rollout or evaluator value) -> backup.
//! Passes run sequentially on the caller's thread, or concurrently on a
//! rayon pool where every worker shares the same tree. Node statistics are
//! locked per node; expansion is checked and committed under the expanding
//! node's separate expansion lock so a node never receives two sets of
//! children, and selection through it never waits on the evaluator.
//!
//! Scores are stored from red's perspective. Selection flips them to the
//! perspective of the side choosing the move, so red maximizes and black
//! minimizes the red-perspective mean.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::MctsConfig;
use super::node::{NodeStats, SearchNode};
use super::policy::{rollout, LeafPolicy, LeafValue, Scoring};
use crate::board::{Board, BoardError, Move};
use crate::eval::EvaluatorError;
use crate::nn::LabelError;

/// Errors that abort a search pass or a tree operation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("evaluator failed: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("cannot advance the tree: {0}")]
    IllegalMove(BoardError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Per-child statistics at the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildStats {
    #[serde(rename = "move")]
    pub mv: Move,
    pub visits: u32,
    /// Mean score from red's perspective.
    pub mean: f32,
    pub prior: f32,
}

/// Outcome of one call to [`Mcts::search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchInfo {
    pub passes: u32,
    pub root_visits: u32,
    pub elapsed: Duration,
}

/// Why a parallel search stopped taking new passes.
enum Halt {
    Expired,
    Failed(SearchError),
}

/// Handle that stops a running search after its in-flight passes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// The search engine, parameterized by its leaf policy.
pub struct Mcts<P> {
    root: Arc<SearchNode>,
    policy: P,
    config: MctsConfig,
    pool: Option<rayon::ThreadPool>,
    stop: StopHandle,
    rng: SmallRng,
}

impl<P: LeafPolicy> Mcts<P> {
    /// Creates an engine with a fresh tree rooted at `board`.
    pub fn new(board: Board, policy: P, config: MctsConfig) -> Self {
        Mcts {
            root: Arc::new(SearchNode::root(board)),
            policy,
            config,
            pool: None,
            stop: StopHandle::default(),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Seeds the engine's random source (tie-breaks and worker seeds).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn root(&self) -> &Arc<SearchNode> {
        &self.root
    }

    pub fn root_board(&self) -> &Board {
        self.root.board()
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Replaces the configuration. The worker pool is rebuilt on the next
    /// search if the thread count changed.
    pub fn set_config(&mut self, config: MctsConfig) {
        if config.threads != self.config.threads {
            self.pool = None;
        }
        self.config = config;
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Discards the tree and starts over from `board`.
    pub fn reset(&mut self, board: Board) {
        self.root = Arc::new(SearchNode::root(board));
    }

    /// Runs up to `config.passes` passes, stopping early on the time budget
    /// or the stop handle. Completed passes are fully backed up; the first
    /// failing pass aborts the search with its error.
    pub fn search(&mut self) -> Result<SearchInfo, SearchError> {
        let start = Instant::now();
        let deadline = self.config.time_budget.map(|b| start + b);
        if self.config.threads > 1 && self.pool.is_none() {
            self.pool = Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.threads)
                    .build()?,
            );
        }

        let completed = AtomicU32::new(0);
        let expired = || {
            self.stop.is_stopped() || deadline.map_or(false, |d| Instant::now() >= d)
        };

        let outcome: Result<(), SearchError> = match &self.pool {
            Some(pool) => {
                let base: u64 = self.rng.gen();
                let worker = AtomicU64::new(0);
                let this = &*self;
                let run = pool.install(|| {
                    (0..this.config.passes).into_par_iter().try_for_each_init(
                        || SmallRng::seed_from_u64(base ^ worker.fetch_add(1, Ordering::Relaxed)),
                        |rng, _| {
                            // Short-circuits the remaining passes once expired.
                            if expired() {
                                return Err(Halt::Expired);
                            }
                            this.run_pass(rng).map_err(Halt::Failed)?;
                            completed.fetch_add(1, Ordering::Relaxed);
                            Ok(())
                        },
                    )
                });
                match run {
                    Ok(()) | Err(Halt::Expired) => Ok(()),
                    Err(Halt::Failed(e)) => Err(e),
                }
            }
            None => {
                let mut rng = SmallRng::seed_from_u64(self.rng.gen());
                (0..self.config.passes)
                    .take_while(|_| !expired())
                    .try_for_each(|_| {
                        self.run_pass(&mut rng)?;
                        completed.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    })
            }
        };
        // A stop request ends this search only.
        self.stop.reset();
        outcome?;

        let info = SearchInfo {
            passes: completed.into_inner(),
            root_visits: self.root.visits(),
            elapsed: start.elapsed(),
        };
        debug!(
            passes = info.passes,
            root_visits = info.root_visits,
            elapsed_ms = info.elapsed.as_millis() as u64,
            "search finished"
        );
        Ok(info)
    }

    /// Searches, then returns the chosen move. `Ok(None)` when the root has
    /// no children (finished game).
    pub fn search_best(&mut self) -> Result<Option<Move>, SearchError> {
        self.search()?;
        Ok(self.best_move())
    }

    /// One select -> expand -> evaluate -> backup pass.
    pub fn run_pass(&self, rng: &mut SmallRng) -> Result<(), SearchError> {
        let mut path: Vec<Arc<SearchNode>> = vec![Arc::clone(&self.root)];
        let mut value: Option<LeafValue> = None;

        loop {
            let node = match path.last() {
                Some(n) => Arc::clone(n),
                None => break,
            };
            if node.is_terminal() {
                break;
            }
            if node.is_expanded() {
                match self.select_child(&node, rng) {
                    Some(child) => {
                        child.add_virtual_loss();
                        path.push(child);
                        continue;
                    }
                    None => break,
                }
            }

            let guard = node.lock_expansion();
            if node.is_expanded() {
                // Another worker won the race; descend through its children.
                drop(guard);
                continue;
            }
            let expansion = match self.policy.expand(&node, rng) {
                Ok(e) => e,
                Err(e) => {
                    drop(guard);
                    release_in_flight(&path);
                    return Err(e);
                }
            };
            let pick = expansion.pick;
            node.set_children(expansion.children);
            drop(guard);

            if let Some(child) = pick.and_then(|i| node.children().get(i)) {
                child.add_virtual_loss();
                path.push(Arc::clone(child));
            }
            value = Some(expansion.value);
            break;
        }

        let leaf = match path.last() {
            Some(n) => Arc::clone(n),
            None => return Ok(()),
        };
        let reward = match value {
            Some(LeafValue::Evaluated(v)) => v,
            Some(LeafValue::Rollout) if !leaf.is_terminal() => rollout(leaf.board().clone(), rng),
            _ => leaf.board().reward().unwrap_or(0.0),
        };
        backpropagate(&path, reward);
        Ok(())
    }

    /// Picks the child with the highest selection score, breaking ties
    /// uniformly at random.
    fn select_child(&self, node: &SearchNode, rng: &mut SmallRng) -> Option<Arc<SearchNode>> {
        let children = node.children();
        if children.is_empty() {
            return None;
        }
        let parent_visits = node.visits();
        let scores: Vec<f32> = children
            .iter()
            .map(|c| {
                selection_score(
                    self.policy.scoring(),
                    &c.stats(),
                    c.prior(),
                    c.mover().sign(),
                    parent_visits,
                    &self.config,
                )
            })
            .collect();
        argmax_random(&scores, rng).map(|i| Arc::clone(&children[i]))
    }

    /// Chooses the move to play: best mean score for the side to move among
    /// visited children, ties broken at random. Falls back to the highest
    /// prior (then a random child) when nothing was visited.
    pub fn best_move(&mut self) -> Option<Move> {
        let children = self.root.children();
        if children.is_empty() {
            return None;
        }
        let stats: Vec<NodeStats> = children.iter().map(|c| c.stats()).collect();

        let exploit: Vec<f32> = children
            .iter()
            .zip(&stats)
            .map(|(c, s)| {
                if s.visits == 0 {
                    f32::NEG_INFINITY
                } else {
                    c.mover().sign() * s.mean()
                }
            })
            .collect();
        let chosen = if stats.iter().any(|s| s.visits > 0) {
            argmax_random(&exploit, &mut self.rng)
        } else {
            let priors: Vec<f32> = children.iter().map(|c| c.prior()).collect();
            argmax_random(&priors, &mut self.rng)
        };
        chosen.and_then(|i| children[i].mv())
    }

    /// Re-roots the tree at the child reached by `mv`, discarding siblings.
    /// Builds a fresh root when no such child exists.
    pub fn advance(&mut self, mv: Move) -> Result<(), SearchError> {
        if let Some(child) = self.root.child(mv) {
            let child = Arc::clone(child);
            debug!(%mv, visits = child.visits(), nodes = child.subtree_size(), "reusing subtree");
            self.root = child;
            return Ok(());
        }
        let mut board = self.root.board().clone();
        board.apply_move(mv).map_err(SearchError::IllegalMove)?;
        debug!(%mv, "no subtree to reuse, fresh root");
        self.root = Arc::new(SearchNode::new(board, Some(mv), 1.0));
        Ok(())
    }

    /// Per-child statistics at the root, in generation order.
    pub fn root_stats(&self) -> Vec<ChildStats> {
        self.root
            .children()
            .iter()
            .filter_map(|c| {
                let stats = c.stats();
                Some(ChildStats {
                    mv: c.mv()?,
                    visits: stats.visits,
                    mean: stats.mean(),
                    prior: c.prior(),
                })
            })
            .collect()
    }
}

/// Selection score of a child from the perspective of the side choosing it.
///
/// `sign` is +1 when red chooses and -1 when black does. In-flight passes
/// count as losses for the chooser, weighted by `config.virtual_loss`.
pub fn selection_score(
    scoring: Scoring,
    stats: &NodeStats,
    prior: f32,
    sign: f32,
    parent_visits: u32,
    config: &MctsConfig,
) -> f32 {
    let visits = stats.visits as f32;
    let in_flight = stats.virtual_loss as f32;
    let n = visits + in_flight;

    let exploit = if n == 0.0 {
        0.0
    } else {
        let q = if stats.visits == 0 { 0.0 } else { sign * stats.score };
        (q - config.virtual_loss * in_flight) / n
    };

    match scoring {
        Scoring::Uct => {
            if n == 0.0 {
                return f32::INFINITY;
            }
            let ln_parent = (parent_visits.max(1) as f32).ln();
            exploit + config.exploration * (ln_parent / n).sqrt()
        }
        Scoring::Puct => {
            let explore = (config.exploration / (1.0 + n).sqrt()) * prior
                * (parent_visits as f32).sqrt()
                / (1.0 + n);
            exploit + explore
        }
    }
}

/// Index of a maximal element, chosen uniformly among ties.
fn argmax_random(values: &[f32], rng: &mut impl Rng) -> Option<usize> {
    let best = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::NEG_INFINITY, f32::max);
    let ties: Vec<usize> = (0..values.len()).filter(|&i| values[i] == best).collect();
    ties.choose(rng).copied()
}

/// Walks the path leaf to root. Every node gains a visit and `value`; every
/// node except the root releases its in-flight marker.
fn backpropagate(path: &[Arc<SearchNode>], value: f32) {
    for (depth, node) in path.iter().enumerate().rev() {
        node.record_visit(value, depth > 0);
    }
}

/// Releases in-flight markers of an aborted pass.
fn release_in_flight(path: &[Arc<SearchNode>]) {
    for node in path.iter().skip(1) {
        node.release_virtual_loss();
    }
}
