use std::collections::VecDeque;

use ndarray::Array2;

use crate::recognition::domain::landmarks::LandmarkFrame;
use crate::shared::constants::FEATURES_PER_FRAME;

/// Sliding window over the most recent landmark frames, oldest first.
///
/// Pushing past capacity evicts the oldest frame.
pub struct LandmarkWindow {
    frames: VecDeque<LandmarkFrame>,
    capacity: usize,
}

impl LandmarkWindow {
    pub fn new(capacity: usize) -> Result<Self, &'static str> {
        if capacity < 1 {
            return Err("window capacity must be >= 1");
        }
        Ok(Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn push(&mut self, frame: LandmarkFrame) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &LandmarkFrame> {
        self.frames.iter()
    }

    /// Classifier input of shape `(capacity, FEATURES_PER_FRAME)`.
    ///
    /// Missing frames are zero rows placed before the buffered frames, so
    /// the newest frame is always the last row.
    pub fn to_padded_input(&self) -> Array2<f32> {
        let mut input = Array2::<f32>::zeros((self.capacity, FEATURES_PER_FRAME));
        let offset = self.capacity - self.frames.len();
        for (i, frame) in self.frames.iter().enumerate() {
            for (j, v) in frame.to_features().into_iter().enumerate() {
                input[[offset + i, j]] = v;
            }
        }
        input
    }
}
