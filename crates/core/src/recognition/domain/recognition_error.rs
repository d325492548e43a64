use std::fmt;

use thiserror::Error;

/// Error type at the extractor/classifier/provider seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which external model failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelComponent {
    LandmarkExtractor,
    SequenceClassifier,
}

impl fmt::Display for ModelComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelComponent::LandmarkExtractor => f.write_str("landmark extractor"),
            ModelComponent::SequenceClassifier => f.write_str("sequence classifier"),
        }
    }
}

/// Errors that reach the session's caller.
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("failed to load {component}: {source}")]
    Initialization {
        component: ModelComponent,
        #[source]
        source: BoxError,
    },
    #[error("detector has been disposed")]
    Disposed,
}

/// Per-frame failures. Logged and dropped by the detector, never returned
/// to the session.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("landmark extraction failed: {0}")]
    Extraction(#[source] BoxError),
    #[error("classification failed: {0}")]
    Classification(#[source] BoxError),
    #[error("classifier returned {actual} scores, expected {expected}")]
    OutputShape { expected: usize, actual: usize },
}
