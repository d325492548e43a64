use ndarray::ArrayView2;

use crate::recognition::domain::recognition_error::BoxError;

/// Domain interface for the landmark-sequence classifier.
///
/// `sequence` is `(window_size, FEATURES_PER_FRAME)`, oldest frame first.
/// The returned vector holds one probability per entry of
/// [`Gesture::ALL`](crate::recognition::domain::gesture::Gesture::ALL).
pub trait SequenceClassifier: Send {
    fn classify(&mut self, sequence: ArrayView2<'_, f32>) -> Result<Vec<f32>, BoxError>;
}
