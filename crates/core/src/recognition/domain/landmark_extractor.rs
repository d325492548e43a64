use crate::recognition::domain::landmarks::LandmarkFrame;
use crate::recognition::domain::recognition_error::BoxError;
use crate::shared::frame::Frame;

/// Domain interface for hand-pose landmark extraction.
///
/// Returns `Ok(None)` when no hand is visible. When several hands are
/// visible, implementations return the one they score highest.
pub trait LandmarkExtractor: Send {
    fn extract(&mut self, frame: &Frame) -> Result<Option<LandmarkFrame>, BoxError>;
}
