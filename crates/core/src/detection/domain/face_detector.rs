use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Returned boxes are in the coordinate space of the given frame.
/// Implementations may be stateful (sessions, caches), hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
