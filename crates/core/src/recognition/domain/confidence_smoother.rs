use serde::{Deserialize, Serialize};

use crate::recognition::domain::gesture::{ClassificationResult, Gesture};
use crate::shared::config::SessionConfig;

/// What the presentation layer shows right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayedPrediction {
    pub gesture: Option<Gesture>,
    /// Always within [0, 1].
    pub confidence: f32,
}

impl DisplayedPrediction {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Two-state display policy: confident results replace the display,
/// anything else decays it.
///
/// Decay lowers confidence by `decay_step` per call, floored at zero. The
/// label is dropped once confidence falls below `clear_threshold`, while
/// the decayed confidence itself is kept.
#[derive(Debug, Clone)]
pub struct ConfidenceSmoother {
    display_threshold: f32,
    decay_step: f32,
    clear_threshold: f32,
}

impl ConfidenceSmoother {
    pub fn new(display_threshold: f32, decay_step: f32, clear_threshold: f32) -> Self {
        Self {
            display_threshold,
            decay_step,
            clear_threshold,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.display_threshold,
            config.decay_step,
            config.clear_threshold,
        )
    }

    /// Applies one frame's outcome. Returns the result if it was displayed.
    pub fn apply(
        &self,
        displayed: &mut DisplayedPrediction,
        result: Option<ClassificationResult>,
    ) -> Option<ClassificationResult> {
        match result {
            Some(r) if r.confidence > self.display_threshold => {
                displayed.gesture = Some(r.gesture);
                displayed.confidence = r.confidence.clamp(0.0, 1.0);
                Some(r)
            }
            _ => {
                self.decay(displayed);
                None
            }
        }
    }

    fn decay(&self, displayed: &mut DisplayedPrediction) {
        displayed.confidence = (displayed.confidence - self.decay_step).max(0.0);
        if displayed.confidence < self.clear_threshold {
            displayed.gesture = None;
        }
    }
}

impl Default for ConfidenceSmoother {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}
