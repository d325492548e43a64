use std::path::PathBuf;
use std::time::Duration;

/// Describes a frame source: dimensions may be zero for landmark recordings,
/// which carry no pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn has_known_rate(&self) -> bool {
        self.fps > 0.0 && self.fps.is_finite()
    }
}

/// Capture time of frame `index` relative to the first frame: `index / fps`,
/// rounded to the nearest nanosecond. Computed per index so
/// the error does not accumulate over long sequences.
pub fn frame_time_at(index: usize, fps: f64) -> Duration {
    Duration::from_nanos((index as f64 * 1e9 / fps).round() as u64)
}
