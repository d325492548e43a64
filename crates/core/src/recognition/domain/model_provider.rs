use crate::recognition::domain::landmark_extractor::LandmarkExtractor;
use crate::recognition::domain::recognition_error::BoxError;
use crate::recognition::domain::sequence_classifier::SequenceClassifier;

/// Load progress callback, 0..=100 for the component being loaded.
pub type LoadProgress<'a> = &'a dyn Fn(u8);

/// Loads the external models a detector depends on.
///
/// Loading may download or compile models, so it is deferred until
/// the detector is initialized rather than done at construction.
pub trait GestureModelProvider: Send {
    fn load_extractor(
        &mut self,
        progress: LoadProgress<'_>,
    ) -> Result<Box<dyn LandmarkExtractor>, BoxError>;

    fn load_classifier(
        &mut self,
        progress: LoadProgress<'_>,
    ) -> Result<Box<dyn SequenceClassifier>, BoxError>;
}
