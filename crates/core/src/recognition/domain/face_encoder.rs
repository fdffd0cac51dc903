use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Fixed-length appearance vector for one face.
pub type Embedding = Vec<f32>;

/// Domain interface for face embedding extraction.
///
/// `Ok(None)` means the region yielded no usable face representation
/// (too small, out of frame, no face); callers label such regions
/// "Unknown" and move on. Errors are reserved for backend failures.
pub trait FaceEncoder: Send {
    fn encode(
        &mut self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<Option<Embedding>, Box<dyn std::error::Error>>;
}
