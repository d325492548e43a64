use std::path::PathBuf;
use std::sync::Arc;

use super::model_resolver::{self, ModelSource};
use super::onnx_hand_landmark_extractor::OnnxHandLandmarkExtractor;
use super::onnx_sequence_classifier::OnnxSequenceClassifier;
use super::replay_landmark_extractor::{LandmarkRecording, ReplayLandmarkExtractor};
use crate::recognition::domain::landmark_extractor::LandmarkExtractor;
use crate::recognition::domain::model_provider::{GestureModelProvider, LoadProgress};
use crate::recognition::domain::recognition_error::BoxError;
use crate::recognition::domain::sequence_classifier::SequenceClassifier;

/// Share of a component's progress spent fetching the file; the rest is
/// building the inference session.
const RESOLVE_SHARE: u64 = 90;

pub enum ExtractorSource {
    Model(ModelSource),
    Replay(Arc<LandmarkRecording>),
}

/// Loads the landmark extractor and classifier from model files,
/// downloading them on first use when a URL is configured.
pub struct OnnxModelProvider {
    extractor: ExtractorSource,
    classifier: ModelSource,
    window_size: usize,
}

impl OnnxModelProvider {
    pub fn new(extractor: ExtractorSource, classifier: ModelSource, window_size: usize) -> Self {
        Self {
            extractor,
            classifier,
            window_size,
        }
    }
}

impl GestureModelProvider for OnnxModelProvider {
    fn load_extractor(
        &mut self,
        progress: LoadProgress<'_>,
    ) -> Result<Box<dyn LandmarkExtractor>, BoxError> {
        match &self.extractor {
            ExtractorSource::Replay(recording) => {
                progress(100);
                Ok(Box::new(ReplayLandmarkExtractor::new(recording.clone())))
            }
            ExtractorSource::Model(source) => {
                let path = resolve_with_progress(source, progress)?;
                let extractor = OnnxHandLandmarkExtractor::new(&path)
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                progress(100);
                Ok(Box::new(extractor))
            }
        }
    }

    fn load_classifier(
        &mut self,
        progress: LoadProgress<'_>,
    ) -> Result<Box<dyn SequenceClassifier>, BoxError> {
        let path = resolve_with_progress(&self.classifier, progress)?;
        let classifier = OnnxSequenceClassifier::new(&path, self.window_size)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        progress(100);
        Ok(Box::new(classifier))
    }
}

fn resolve_with_progress(
    source: &ModelSource,
    progress: LoadProgress<'_>,
) -> Result<PathBuf, BoxError> {
    let on_bytes = |downloaded: u64, total: u64| {
        if total > 0 {
            progress((downloaded.min(total) * RESOLVE_SHARE / total) as u8);
        }
    };
    let path = model_resolver::resolve(source, Some(&on_bytes))?;
    progress(RESOLVE_SHARE as u8);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{GESTURE_CLASSIFIER_MODEL_NAME, LANDMARK_COUNT};
    use crate::shared::frame::Frame;
    use std::sync::Mutex;

    fn missing(name: &str) -> ModelSource {
        ModelSource {
            path: Some(PathBuf::from(format!("/nonexistent/{name}"))),
            ..ModelSource::named(name)
        }
    }

    #[test]
    fn test_replay_extractor_loads_without_files() {
        let recording = LandmarkRecording {
            fps: 30.0,
            frames: vec![Some(vec![[0.5, 0.5]; LANDMARK_COUNT])],
        };
        let mut provider = OnnxModelProvider::new(
            ExtractorSource::Replay(Arc::new(recording)),
            missing(GESTURE_CLASSIFIER_MODEL_NAME),
            30,
        );
        let seen = Mutex::new(Vec::new());

        let mut extractor = provider
            .load_extractor(&|p| seen.lock().unwrap().push(p))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![100]);
        assert!(extractor.extract(&Frame::blank(0)).unwrap().is_some());
    }

    #[test]
    fn test_missing_classifier_file_fails() {
        let mut provider = OnnxModelProvider::new(
            ExtractorSource::Replay(Arc::new(LandmarkRecording {
                fps: 30.0,
                frames: vec![],
            })),
            missing(GESTURE_CLASSIFIER_MODEL_NAME),
            30,
        );

        let err = provider.load_classifier(&|_| {}).err().unwrap();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_missing_extractor_file_fails() {
        let mut provider = OnnxModelProvider::new(
            ExtractorSource::Model(missing("hand_landmark.onnx")),
            missing(GESTURE_CLASSIFIER_MODEL_NAME),
            30,
        );
        assert!(provider.load_extractor(&|_| {}).is_err());
    }
}
