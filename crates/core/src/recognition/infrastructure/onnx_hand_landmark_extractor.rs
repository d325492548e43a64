/// Hand landmark model running on ONNX Runtime via `ort`.
///
/// Expects a MediaPipe-style hand landmark model: a square RGB input and
/// outputs holding 21 `(x, y, z)` points in input pixels plus a single
/// hand-presence score.
use std::path::Path;

use ndarray::Array4;
use ort::session::Session;

use super::execution_provider::{build_session, first_input_shape};
use crate::recognition::domain::landmark_extractor::LandmarkExtractor;
use crate::recognition::domain::landmarks::LandmarkFrame;
use crate::recognition::domain::recognition_error::BoxError;
use crate::shared::constants::LANDMARK_COUNT;
use crate::shared::frame::Frame;

/// Fallback input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 224;

/// Presence scores below this mean no hand.
const PRESENCE_THRESHOLD: f32 = 0.5;

const VALUES_PER_LANDMARK: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    /// `[1, H, W, 3]`
    Nhwc,
    /// `[1, 3, H, W]`
    Nchw,
}

pub struct OnnxHandLandmarkExtractor {
    session: Session,
    input_size: u32,
    layout: Layout,
}

impl OnnxHandLandmarkExtractor {
    /// Load a hand landmark model and prepare for inference.
    ///
    /// Layout and resolution are read from the model's input shape, falling
    /// back to NHWC at 224 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let (layout, input_size) = first_input_shape(&session)
            .and_then(|shape| input_layout(&shape))
            .unwrap_or((Layout::Nhwc, DEFAULT_INPUT_SIZE));
        log::debug!("Hand landmark model input: {input_size}px {layout:?}");
        Ok(Self {
            session,
            input_size,
            layout,
        })
    }

    fn run(&mut self, frame: &Frame) -> Result<Option<LandmarkFrame>, Box<dyn std::error::Error>> {
        let input = preprocess(frame, self.input_size, self.layout)?;
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        let mut points: Option<Vec<f32>> = None;
        let mut presence: Option<f32> = None;
        for i in 0..outputs.len() {
            let tensor = outputs[i].try_extract_array::<f32>()?;
            let values: Vec<f32> = tensor.iter().copied().collect();
            if points.is_none() && values.len() >= LANDMARK_COUNT * VALUES_PER_LANDMARK {
                points = Some(values);
            } else if presence.is_none() && values.len() == 1 {
                presence = Some(values[0]);
            }
        }

        let points = points.ok_or("hand landmark model produced no landmark output")?;
        if let Some(score) = presence {
            if presence_probability(score) < PRESENCE_THRESHOLD {
                return Ok(None);
            }
        }
        Ok(Some(parse_landmarks(&points, self.input_size)?))
    }
}

impl LandmarkExtractor for OnnxHandLandmarkExtractor {
    fn extract(&mut self, frame: &Frame) -> Result<Option<LandmarkFrame>, BoxError> {
        self.run(frame).map_err(|e| e.to_string().into())
    }
}

fn input_layout(shape: &[Option<usize>]) -> Option<(Layout, u32)> {
    if shape.len() != 4 {
        return None;
    }
    match (shape[1], shape[3]) {
        (_, Some(3)) => shape[1].map(|s| (Layout::Nhwc, s as u32)),
        (Some(3), _) => shape[2].map(|s| (Layout::Nchw, s as u32)),
        _ => None,
    }
}

/// Resize frame to `size × size` and normalize to [0,1] float32.
fn preprocess(frame: &Frame, size: u32, layout: Layout) -> Result<Array4<f32>, String> {
    if frame.is_blank() || frame.channels() < 3 {
        return Err(format!("frame {} has no RGB pixels", frame.index()));
    }
    let src = frame.as_ndarray().map_err(|e| e.to_string())?;
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = match layout {
        Layout::Nhwc => Array4::<f32>::zeros((1, s, s, 3)),
        Layout::Nchw => Array4::<f32>::zeros((1, 3, s, s)),
    };
    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                let value = src[[src_y, src_x, c]] as f32 / 255.0;
                match layout {
                    Layout::Nhwc => tensor[[0, y, x, c]] = value,
                    Layout::Nchw => tensor[[0, c, y, x]] = value,
                }
            }
        }
    }
    Ok(tensor)
}

/// Some exports emit a raw logit instead of a probability.
fn presence_probability(score: f32) -> f32 {
    if (0.0..=1.0).contains(&score) {
        score
    } else {
        1.0 / (1.0 + (-score).exp())
    }
}

/// Converts `(x, y, z)` triples in input pixels to normalized points.
fn parse_landmarks(values: &[f32], input_size: u32) -> Result<LandmarkFrame, String> {
    let scale = input_size as f32;
    let pairs: Vec<[f32; 2]> = values
        .chunks_exact(VALUES_PER_LANDMARK)
        .take(LANDMARK_COUNT)
        .map(|p| [p[0] / scale, p[1] / scale])
        .collect();
    LandmarkFrame::from_pairs(&pairs)
}
