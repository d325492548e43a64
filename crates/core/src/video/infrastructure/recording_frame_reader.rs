use std::path::Path;
use std::sync::Arc;

use crate::recognition::infrastructure::replay_landmark_extractor::LandmarkRecording;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Yields one blank frame per entry of a landmark recording.
///
/// Frames carry only their index; pair this reader with a
/// `ReplayLandmarkExtractor` built from [`RecordingFrameReader::recording`].
#[derive(Default)]
pub struct RecordingFrameReader {
    recording: Option<Arc<LandmarkRecording>>,
}

impl RecordingFrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recording loaded by `open`.
    pub fn recording(&self) -> Option<Arc<LandmarkRecording>> {
        self.recording.clone()
    }
}

impl VideoReader for RecordingFrameReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let recording = LandmarkRecording::load(path)?;
        let metadata = VideoMetadata {
            width: 0,
            height: 0,
            fps: recording.fps,
            total_frames: recording.len(),
            source_path: Some(path.to_path_buf()),
        };
        self.recording = Some(Arc::new(recording));
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let total = self.recording.as_ref().map_or(0, |r| r.len());
        Box::new((0..total).map(|index| Ok::<_, Box<dyn std::error::Error>>(Frame::blank(index))))
    }

    fn close(&mut self) {
        self.recording = None;
    }
}
