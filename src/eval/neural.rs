//! Neural network evaluation via ONNX Runtime.
//!
//! Loads a two-headed policy/value model and runs inference using the `ort`
//! crate. The model takes a `[1, 10, 9, 9]` float input and returns policy
//! logits over the label space followed by a tanh value.
//!
//! Without the `neural` feature, loading always fails with
//! [`EvaluatorError::ModelUnavailable`].

#[cfg(feature = "neural")]
use ort::session::{builder::GraphOptimizationLevel, Session};
#[cfg(feature = "neural")]
use std::sync::Mutex;

use super::{Evaluation, Evaluator, EvaluatorError};
#[cfg(feature = "neural")]
use crate::nn::{NUM_LABELS, TENSOR_SHAPE};

/// ONNX-backed evaluator. The session is shared behind a mutex.
pub struct OnnxEvaluator {
    #[cfg(feature = "neural")]
    session: Mutex<Session>,
}

impl OnnxEvaluator {
    /// Loads a model from `path`, using `intra_threads` inference threads.
    pub fn load(path: &str, intra_threads: usize) -> Result<Self, EvaluatorError> {
        #[cfg(feature = "neural")]
        {
            let session = Session::builder()
                .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
                .and_then(|b| b.with_intra_threads(intra_threads))
                .and_then(|b| b.commit_from_file(path))
                .map_err(|e| {
                    tracing::warn!(path, error = %e, "failed to load ONNX model");
                    EvaluatorError::Inference(e.to_string())
                })?;
            tracing::info!(path, "loaded ONNX model");
            Ok(OnnxEvaluator {
                session: Mutex::new(session),
            })
        }

        #[cfg(not(feature = "neural"))]
        {
            let _ = (path, intra_threads);
            tracing::warn!("neural eval disabled (compiled without 'neural' feature)");
            Err(EvaluatorError::ModelUnavailable)
        }
    }
}

impl Evaluator for OnnxEvaluator {
    fn evaluate(&self, tensor: &[f32]) -> Result<Evaluation, EvaluatorError> {
        #[cfg(feature = "neural")]
        {
            let mut session = self
                .session
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            run_inference(&mut session, tensor)
        }
        #[cfg(not(feature = "neural"))]
        {
            let _ = tensor;
            Err(EvaluatorError::ModelUnavailable)
        }
    }
}

/// Runs single-position inference and converts logits to probabilities.
#[cfg(feature = "neural")]
fn run_inference(session: &mut Session, tensor: &[f32]) -> Result<Evaluation, EvaluatorError> {
    use ort::value::Value;

    let infer = |e: ort::Error| EvaluatorError::Inference(e.to_string());
    let [rows, cols, channels] = TENSOR_SHAPE;

    let input = Value::from_array(([1, rows, cols, channels], tensor.to_vec())).map_err(infer)?;
    let outputs = session.run(ort::inputs![input]).map_err(infer)?;

    let (_shape, logits) = outputs[0].try_extract_tensor::<f32>().map_err(infer)?;
    if logits.len() != NUM_LABELS {
        return Err(EvaluatorError::PolicyLength {
            expected: NUM_LABELS,
            got: logits.len(),
        });
    }
    let (_shape, value) = outputs[1].try_extract_tensor::<f32>().map_err(infer)?;
    let value = value
        .first()
        .copied()
        .ok_or_else(|| EvaluatorError::Inference("empty value output".to_string()))?;

    Ok(Evaluation {
        policy: softmax(logits),
        value,
    })
}

/// Numerically stable softmax.
#[cfg_attr(not(feature = "neural"), allow(dead_code))]
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
