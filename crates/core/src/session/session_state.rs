use serde::Serialize;

use crate::recognition::domain::gesture::{Gesture, Prediction};

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub active: bool,
    pub label: Option<Gesture>,
    /// Displayed confidence, within [0, 1].
    pub confidence: f32,
    /// Oldest first.
    pub history: Vec<Prediction>,
    pub model_ready: bool,
    /// 0..=100
    pub load_progress: u8,
}

/// Why `process_frame` did not run detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Inactive,
    ModelNotReady,
    /// Another frame is still being processed.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    Processed,
    Skipped(SkipReason),
}

impl FrameDisposition {
    pub fn is_processed(&self) -> bool {
        matches!(self, FrameDisposition::Processed)
    }
}
