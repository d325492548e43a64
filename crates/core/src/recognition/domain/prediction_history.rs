use std::collections::VecDeque;
use std::time::Duration;

use crate::recognition::domain::gesture::Prediction;
use crate::shared::config::SessionConfig;

/// Why a prediction was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    BelowThreshold,
    /// Same gesture as the last entry, inside the re-admission gap.
    Duplicate,
}

/// Bounded, insertion-ordered record of distinct recognized gestures.
///
/// A prediction is admitted when its confidence is strictly above the
/// admission threshold and it is not a repeat of the last entry's gesture
/// within `min_gap`. Once over `capacity`, the oldest entries are dropped.
#[derive(Debug, Clone)]
pub struct PredictionHistory {
    entries: VecDeque<Prediction>,
    capacity: usize,
    admission_threshold: f32,
    min_gap: Duration,
}

impl PredictionHistory {
    pub fn new(
        capacity: usize,
        admission_threshold: f32,
        min_gap: Duration,
    ) -> Result<Self, &'static str> {
        if capacity == 0 {
            return Err("history capacity must be at least 1");
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            admission_threshold,
            min_gap,
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, &'static str> {
        Self::new(
            config.history_capacity,
            config.history_threshold,
            config.dedup_window(),
        )
    }

    pub fn offer(&mut self, prediction: Prediction) -> Result<(), Rejection> {
        if prediction.confidence <= self.admission_threshold {
            return Err(Rejection::BelowThreshold);
        }
        if let Some(last) = self.entries.back() {
            let gap = prediction.timestamp.saturating_sub(last.timestamp);
            if last.gesture == prediction.gesture && gap < self.min_gap {
                return Err(Rejection::Duplicate);
            }
        }

        self.entries.push_back(prediction);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Prediction> {
        self.entries.back()
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<Prediction> {
        self.entries.iter().copied().collect()
    }
}
