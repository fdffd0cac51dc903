use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Decorator that detects on a downscaled copy of the frame and maps the
/// resulting boxes back to full-frame coordinates.
///
/// Detection cost scales with pixel count, so running the detector at a
/// quarter of the resolution makes the periodic detection pass cheap
/// enough for a live loop. Box coordinates lose up to `factor - 1`
/// pixels of precision, which the visual trackers immediately absorb.
pub struct DownscaledDetector {
    inner: Box<dyn FaceDetector>,
    factor: u32,
}

impl DownscaledDetector {
    pub fn new(inner: Box<dyn FaceDetector>, factor: u32) -> Result<Self, &'static str> {
        if factor < 1 {
            return Err("downscale factor must be >= 1");
        }
        Ok(Self { inner, factor })
    }
}

impl FaceDetector for DownscaledDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        if self.factor == 1 {
            return self.inner.detect(frame);
        }
        let small = frame.downscaled(self.factor);
        let boxes = self.inner.detect(&small)?;
        Ok(boxes
            .iter()
            .map(|b| b.scaled(self.factor as i32))
            .collect())
    }
}
