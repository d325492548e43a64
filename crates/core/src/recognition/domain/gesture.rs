use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The closed set of signs the classifier was trained on.
///
/// Classifier output index `i` scores `Gesture::ALL[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Hello,
    ThankYou,
}

impl Gesture {
    pub const ALL: &[Gesture] = &[Gesture::Hello, Gesture::ThankYou];

    pub fn from_index(index: usize) -> Option<Gesture> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gesture::Hello => "hello",
            Gesture::ThankYou => "thank you",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Top-scoring gesture of one classifier run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub gesture: Gesture,
    pub confidence: f32,
}

impl ClassificationResult {
    /// Arg-max over a per-gesture score vector.
    ///
    /// Returns `None` if `scores` has no entries or a score is NaN at the top.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        let (index, &confidence) = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
        if confidence.is_nan() {
            return None;
        }
        Some(Self {
            gesture: Gesture::from_index(index)?,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

/// A recognized gesture admitted to the session history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub gesture: Gesture,
    pub confidence: f32,
    /// Capture time on the session clock.
    pub timestamp: Duration,
}
