//! Leaf policies: how a node is expanded and how its value is obtained.
//!
//! [`RolloutPolicy`] plays random games to the end; [`GuidedPolicy`] asks an
//! [`Evaluator`] for move priors and a position value instead.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::mcts::SearchError;
use super::node::SearchNode;
use crate::board::{Board, Move};
use crate::eval::Evaluator;
use crate::movegen;
use crate::nn::{encode_position, label_index};

/// Child-selection formula used while descending the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scoring {
    /// Upper confidence bound; unvisited children first.
    Uct,
    /// Prior-weighted upper confidence bound.
    Puct,
}

/// Where the value backed up after an expansion comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafValue {
    /// Play a random game from the picked child.
    Rollout,
    /// Back up this value. Unvisited children hold it as a provisional score.
    Evaluated(f32),
}

/// Result of expanding one node.
#[derive(Debug)]
pub struct Expansion {
    pub children: Vec<Arc<SearchNode>>,
    /// Index of the child to back up from. None when there are no children.
    pub pick: Option<usize>,
    pub value: LeafValue,
}

/// Strategy injected into the search engine.
pub trait LeafPolicy: Send + Sync {
    /// Selection formula for this policy.
    fn scoring(&self) -> Scoring;

    /// Builds the children of a non-terminal node. Called at most once per
    /// node, under its lock. Must not touch any other node.
    fn expand(&self, node: &SearchNode, rng: &mut SmallRng) -> Result<Expansion, SearchError>;
}

/// Plays uniformly random moves until the game ends. Returns the reward from
/// red's perspective: +1 red win, -1 black win, 0 draw.
pub fn rollout(mut board: Board, rng: &mut impl Rng) -> f32 {
    while !board.game_over() {
        match movegen::random_move(&board, rng) {
            Some(mv) => {
                board.commit_move(mv);
            }
            None => break,
        }
    }
    board.reward().unwrap_or(0.0)
}

/// One child per successor, with `(prior, initial score)` from `seed`.
fn build_children(
    node: &SearchNode,
    seed: impl Fn(Move) -> Result<(f32, f32), SearchError>,
) -> Result<Vec<Arc<SearchNode>>, SearchError> {
    node.board()
        .successors()
        .into_iter()
        .map(|(board, mv)| {
            let (prior, score) = seed(mv)?;
            Ok(Arc::new(SearchNode::with_score(board, Some(mv), prior, score)))
        })
        .collect()
}

/// Random-rollout leaf evaluation with plain UCT selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutPolicy;

impl LeafPolicy for RolloutPolicy {
    fn scoring(&self) -> Scoring {
        Scoring::Uct
    }

    fn expand(&self, node: &SearchNode, rng: &mut SmallRng) -> Result<Expansion, SearchError> {
        let children = build_children(node, |_| Ok((0.0, 0.0)))?;
        let indices: Vec<usize> = (0..children.len()).collect();
        let pick = indices.choose(rng).copied();
        Ok(Expansion {
            children,
            pick,
            value: LeafValue::Rollout,
        })
    }
}

/// Evaluator-guided expansion with PUCT selection.
#[derive(Debug, Clone)]
pub struct GuidedPolicy<E> {
    evaluator: E,
}

impl<E: Evaluator> GuidedPolicy<E> {
    pub fn new(evaluator: E) -> Self {
        GuidedPolicy { evaluator }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }
}

impl<E: Evaluator> LeafPolicy for GuidedPolicy<E> {
    fn scoring(&self) -> Scoring {
        Scoring::Puct
    }

    fn expand(&self, node: &SearchNode, rng: &mut SmallRng) -> Result<Expansion, SearchError> {
        let tensor = encode_position(node.board(), node.mv());
        let eval = self.evaluator.evaluate(&tensor)?;
        eval.check_len()?;

        let children = build_children(node, |mv| {
            let index = label_index(mv)?;
            Ok((eval.policy[index], eval.value))
        })?;

        let best = children
            .iter()
            .map(|c| c.prior())
            .fold(f32::NEG_INFINITY, f32::max);
        let top: Vec<usize> = (0..children.len())
            .filter(|&i| children[i].prior() == best)
            .collect();
        let pick = top.choose(rng).copied();

        tracing::trace!(children = children.len(), value = eval.value, "guided expansion");
        Ok(Expansion {
            children,
            pick,
            value: LeafValue::Evaluated(eval.value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, PieceKind, Side, Square};
    use crate::eval::{Evaluation, EvaluatorError, UniformEvaluator};
    use crate::nn::NUM_LABELS;
    use rand::SeedableRng;

    /// Puts all probability mass on one label.
    struct PeakedEvaluator {
        label: usize,
        value: f32,
    }

    impl Evaluator for PeakedEvaluator {
        fn evaluate(&self, _tensor: &[f32]) -> Result<Evaluation, EvaluatorError> {
            let mut policy = vec![0.0; NUM_LABELS];
            policy[self.label] = 1.0;
            Ok(Evaluation {
                policy,
                value: self.value,
            })
        }
    }

    #[test]
    fn rollout_reaches_a_result() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..5 {
            let reward = rollout(Board::new(), &mut rng);
            assert!(reward == 1.0 || reward == -1.0 || reward == 0.0);
        }
    }

    #[test]
    fn rollout_on_finished_game_returns_its_reward() {
        let mut board = Board::empty();
        board.set_piece(Square::new(9, 4), Some(Piece::new(Side::Red, PieceKind::King)));
        board.set_piece(Square::new(0, 3), Some(Piece::new(Side::Black, PieceKind::King)));
        board.set_piece(Square::new(5, 3), Some(Piece::new(Side::Red, PieceKind::Rook)));
        board
            .apply_move(Move::new(Square::new(5, 3), Square::new(0, 3)))
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(rollout(board, &mut rng), 1.0);
    }

    #[test]
    fn rollout_expansion_has_no_priors() {
        let node = SearchNode::root(Board::new());
        let mut rng = SmallRng::seed_from_u64(3);
        let exp = RolloutPolicy.expand(&node, &mut rng).unwrap();
        assert_eq!(exp.children.len(), 44);
        assert!(exp.pick.is_some());
        assert_eq!(exp.value, LeafValue::Rollout);
        assert!(exp.children.iter().all(|c| c.prior() == 0.0));
    }

    #[test]
    fn guided_expansion_seeds_priors_and_scores() {
        let mv = Move::from_notation("b2e2").unwrap();
        let policy = GuidedPolicy::new(PeakedEvaluator {
            label: label_index(mv).unwrap(),
            value: 0.3,
        });
        let node = SearchNode::root(Board::new());
        let mut rng = SmallRng::seed_from_u64(3);
        let exp = policy.expand(&node, &mut rng).unwrap();

        let pick = exp.pick.unwrap();
        assert_eq!(exp.children[pick].mv(), Some(mv));
        assert_eq!(exp.value, LeafValue::Evaluated(0.3));
        for child in &exp.children {
            assert!((child.stats().score - 0.3).abs() < 1e-6);
            assert_eq!(child.visits(), 0);
        }
    }

    #[test]
    fn uniform_guided_expansion() {
        let policy = GuidedPolicy::new(UniformEvaluator::new());
        let node = SearchNode::root(Board::new());
        let mut rng = SmallRng::seed_from_u64(11);
        let exp = policy.expand(&node, &mut rng).unwrap();
        let p = 1.0 / NUM_LABELS as f32;
        assert!(exp.children.iter().all(|c| (c.prior() - p).abs() < 1e-9));
    }
}
