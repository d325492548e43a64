/// LSTM gesture classifier running on ONNX Runtime via `ort`.
///
/// Feeds the padded landmark window as a `[1, window, 42]` tensor and
/// returns one score per gesture label.
use std::path::Path;

use ndarray::{ArrayView2, Axis};
use ort::session::Session;

use super::execution_provider::{build_session, first_input_shape};
use crate::recognition::domain::recognition_error::BoxError;
use crate::recognition::domain::sequence_classifier::SequenceClassifier;
use crate::shared::constants::FEATURES_PER_FRAME;

/// Tolerance when deciding whether raw outputs already sum to one.
const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

pub struct OnnxSequenceClassifier {
    session: Session,
    window_size: usize,
}

impl OnnxSequenceClassifier {
    /// Loads the model and checks its input shape against `window_size`.
    ///
    /// Dynamic axes are accepted as-is.
    pub fn new(model_path: &Path, window_size: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        if let Some(shape) = first_input_shape(&session) {
            check_input_shape(&shape, window_size)?;
        }
        Ok(Self {
            session,
            window_size,
        })
    }

    fn run(&mut self, sequence: ArrayView2<'_, f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        if sequence.nrows() != self.window_size {
            return Err(format!(
                "expected {} rows, got {}",
                self.window_size,
                sequence.nrows()
            )
            .into());
        }
        let input = sequence.to_owned().insert_axis(Axis(0));
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("classifier produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        Ok(to_distribution(tensor.iter().copied().collect()))
    }
}

impl SequenceClassifier for OnnxSequenceClassifier {
    fn classify(&mut self, sequence: ArrayView2<'_, f32>) -> Result<Vec<f32>, BoxError> {
        self.run(sequence).map_err(|e| e.to_string().into())
    }
}

fn check_input_shape(shape: &[Option<usize>], window_size: usize) -> Result<(), String> {
    if shape.len() != 3 {
        return Err(format!("expected a rank-3 input, model has {shape:?}"));
    }
    if let Some(w) = shape[1] {
        if w != window_size {
            return Err(format!("model window is {w}, configured window is {window_size}"));
        }
    }
    if let Some(f) = shape[2] {
        if f != FEATURES_PER_FRAME {
            return Err(format!(
                "model expects {f} features per frame, landmarks give {FEATURES_PER_FRAME}"
            ));
        }
    }
    Ok(())
}

/// Returns `scores` unchanged if they already form a probability
/// distribution, otherwise their softmax.
fn to_distribution(scores: Vec<f32>) -> Vec<f32> {
    let in_range = scores.iter().all(|s| (0.0..=1.0).contains(s));
    let sum: f32 = scores.iter().sum();
    if in_range && (sum - 1.0).abs() <= DISTRIBUTION_TOLERANCE {
        return scores;
    }
    softmax(&scores)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}
