//! Position evaluation for guided search.
//!
//! An [`Evaluator`] maps an encoded position (see [`crate::nn::encoding`])
//! to a probability per move label and a scalar value. The search calls it
//! once per expansion, possibly from several worker threads at the same time.

pub mod neural;

pub use neural::OnnxEvaluator;

use crate::nn::NUM_LABELS;

/// Errors raised by an evaluator. Fatal to the search pass that hit them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluatorError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("policy has {got} entries, expected {expected}")]
    PolicyLength { expected: usize, got: usize },

    #[error("no model loaded")]
    ModelUnavailable,
}

/// Output of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Probability per move label, indexed by [`crate::nn::label_index`].
    pub policy: Vec<f32>,

    /// Position value in [-1, 1] from red's perspective.
    pub value: f32,
}

impl Evaluation {
    /// Checks that the policy covers the whole label space.
    pub fn check_len(&self) -> Result<(), EvaluatorError> {
        if self.policy.len() != NUM_LABELS {
            return Err(EvaluatorError::PolicyLength {
                expected: NUM_LABELS,
                got: self.policy.len(),
            });
        }
        Ok(())
    }
}

/// Policy/value function consulted at expansion time.
///
/// Implementations must tolerate concurrent calls.
pub trait Evaluator: Send + Sync {
    /// Evaluates one flattened position tensor.
    fn evaluate(&self, tensor: &[f32]) -> Result<Evaluation, EvaluatorError>;
}

/// Evaluator with a flat policy and a neutral value. Useful for exercising
/// guided search without a trained model.
#[derive(Debug, Clone, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(&self, _tensor: &[f32]) -> Result<Evaluation, EvaluatorError> {
        Ok(Evaluation {
            policy: vec![1.0 / NUM_LABELS as f32; NUM_LABELS],
            value: 0.0,
        })
    }
}

impl<E: Evaluator + ?Sized> Evaluator for std::sync::Arc<E> {
    fn evaluate(&self, tensor: &[f32]) -> Result<Evaluation, EvaluatorError> {
        (**self).evaluate(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::nn::encode_position;

    #[test]
    fn uniform_policy_sums_to_one() {
        let tensor = encode_position(&Board::new(), None);
        let eval = UniformEvaluator::new().evaluate(&tensor).unwrap();
        assert!(eval.check_len().is_ok());
        let sum: f32 = eval.policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3);
        assert_eq!(eval.value, 0.0);
    }

    #[test]
    fn short_policy_is_rejected() {
        let eval = Evaluation {
            policy: vec![0.5; 10],
            value: 0.0,
        };
        assert_eq!(
            eval.check_len(),
            Err(EvaluatorError::PolicyLength {
                expected: NUM_LABELS,
                got: 10
            })
        );
    }
}
