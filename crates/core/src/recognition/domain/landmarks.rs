//! Hand-pose landmarks as produced by a landmark extractor.
//!
//! Coordinates are normalized to the frame: (0, 0) is top-left, (1, 1)
//! bottom-right. Values outside that range are clamped on construction.

use serde::{Deserialize, Serialize};

use crate::shared::constants::{FEATURES_PER_FRAME, LANDMARK_COUNT};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: normalize(x),
            y: normalize(y),
        }
    }
}

fn normalize(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// One detected hand pose: exactly [`LANDMARK_COUNT`] points.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Builds a frame from `(x, y)` pairs; fails unless exactly
    /// [`LANDMARK_COUNT`] pairs are given.
    pub fn from_pairs(pairs: &[[f32; 2]]) -> Result<Self, String> {
        if pairs.len() != LANDMARK_COUNT {
            return Err(format!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                pairs.len()
            ));
        }
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for (point, [x, y]) in points.iter_mut().zip(pairs) {
            *point = Landmark::new(*x, *y);
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// `[x0, y0, x1, y1, ...]`, the classifier's per-frame feature row.
    pub fn to_features(&self) -> [f32; FEATURES_PER_FRAME] {
        let mut row = [0.0; FEATURES_PER_FRAME];
        for (i, p) in self.points.iter().enumerate() {
            row[i * 2] = p.x;
            row[i * 2 + 1] = p.y;
        }
        row
    }
}
