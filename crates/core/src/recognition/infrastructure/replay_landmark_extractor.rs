use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognition::domain::landmark_extractor::LandmarkExtractor;
use crate::recognition::domain::landmarks::LandmarkFrame;
use crate::recognition::domain::recognition_error::BoxError;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("failed to read recording {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse recording {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write recording {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame {frame}: {reason}")]
    InvalidFrame { frame: usize, reason: String },
    #[error("recording fps must be positive, got {0}")]
    InvalidFps(f64),
}

/// Hand landmarks captured per frame, `null` where no hand was seen.
///
/// ```json
/// { "fps": 30.0, "frames": [null, [[0.41, 0.62], ...21 points], ...] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecording {
    pub fps: f64,
    pub frames: Vec<Option<Vec<[f32; 2]>>>,
}

impl LandmarkRecording {
    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let text = fs::read_to_string(path).map_err(|e| RecordingError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let recording: Self = serde_json::from_str(&text).map_err(|e| RecordingError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        recording.validate()?;
        log::info!(
            "Loaded landmark recording {} ({} frames at {} fps)",
            path.display(),
            recording.len(),
            recording.fps
        );
        Ok(recording)
    }

    pub fn save(&self, path: &Path) -> Result<(), RecordingError> {
        let write_err = |e| RecordingError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        let json = serde_json::to_string(self).map_err(|e| RecordingError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Every recorded hand must have exactly 21 points.
    pub fn validate(&self) -> Result<(), RecordingError> {
        if !(self.fps > 0.0 && self.fps.is_finite()) {
            return Err(RecordingError::InvalidFps(self.fps));
        }
        for (i, frame) in self.frames.iter().enumerate() {
            if let Some(pairs) = frame {
                LandmarkFrame::from_pairs(pairs)
                    .map_err(|reason| RecordingError::InvalidFrame { frame: i, reason })?;
            }
        }
        Ok(())
    }
}

/// Replays a recording: frame `i` yields the landmarks recorded at `i`.
pub struct ReplayLandmarkExtractor {
    recording: Arc<LandmarkRecording>,
}

impl ReplayLandmarkExtractor {
    pub fn new(recording: Arc<LandmarkRecording>) -> Self {
        Self { recording }
    }
}

impl LandmarkExtractor for ReplayLandmarkExtractor {
    fn extract(&mut self, frame: &Frame) -> Result<Option<LandmarkFrame>, BoxError> {
        match self.recording.frames.get(frame.index()) {
            None => Err(format!(
                "frame {} is past the end of a {}-frame recording",
                frame.index(),
                self.recording.len()
            )
            .into()),
            Some(None) => Ok(None),
            Some(Some(pairs)) => Ok(Some(LandmarkFrame::from_pairs(pairs)?)),
        }
    }
}
