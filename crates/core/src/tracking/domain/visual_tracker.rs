use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Capability interface of a single-object visual tracker.
///
/// One instance is bound to one face region at creation and advanced
/// once per frame. `None` means the target was lost; the owning track
/// is removed on the spot and never resumed.
pub trait VisualTracker: Send {
    fn update(&mut self, frame: &Frame) -> Option<BoundingBox>;
}

/// Creates a tracker locked onto `bbox` in `frame`.
///
/// The factory is the swap point for tracking algorithms: lifecycle
/// logic only ever sees the two traits, never a concrete tracker.
pub trait TrackerFactory: Send {
    fn start(&self, frame: &Frame, bbox: &BoundingBox) -> Box<dyn VisualTracker>;
}
