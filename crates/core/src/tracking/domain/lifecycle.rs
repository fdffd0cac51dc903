use crate::detection::domain::detection_filter::filter_contained;
use crate::detection::domain::face_detector::FaceDetector;
use crate::recognition::domain::face_encoder::FaceEncoder;
use crate::recognition::domain::gallery::Gallery;
use crate::shared::bbox::BoundingBox;
use crate::shared::constants::UNKNOWN_LABEL;
use crate::shared::frame::Frame;
use crate::tracking::domain::track::TrackSet;
use crate::tracking::domain::visual_tracker::TrackerFactory;

/// Runs the periodic detection cycle and folds its results into the
/// track set.
///
/// One reconcile pass: detect → drop nested boxes → skip boxes that
/// match a live track geometrically → for the genuinely new ones,
/// resolve an identity (once, forever) and spawn a tracker.
pub struct TrackLifecycleManager {
    detector: Box<dyn FaceDetector>,
    encoder: Box<dyn FaceEncoder>,
    tracker_factory: Box<dyn TrackerFactory>,
    gallery: Gallery,
    iou_threshold: f64,
    match_threshold: f32,
}

impl TrackLifecycleManager {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        encoder: Box<dyn FaceEncoder>,
        tracker_factory: Box<dyn TrackerFactory>,
        gallery: Gallery,
        iou_threshold: f64,
        match_threshold: f32,
    ) -> Self {
        Self {
            detector,
            encoder,
            tracker_factory,
            gallery,
            iou_threshold,
            match_threshold,
        }
    }

    /// One detection cycle against `frame`. Returns the number of new
    /// tracks created.
    ///
    /// Expects `tracks` to have been advanced for this frame already,
    /// so the geometric comparison runs against up-to-date boxes.
    /// Idempotent for an unchanged frame: every box the first pass
    /// accepted is matched by its own track on the second pass.
    pub fn reconcile(
        &mut self,
        frame: &Frame,
        tracks: &mut TrackSet,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let batch = self.detector.detect(frame)?;
        let final_boxes = filter_contained(&batch);
        log::debug!(
            "Detection pass at frame {}: {} raw, {} after containment filter",
            frame.index(),
            batch.len(),
            final_boxes.len()
        );

        let mut created = 0;
        for bbox in final_boxes {
            if tracks.overlaps_any(&bbox, self.iou_threshold) {
                continue;
            }

            let identity = self.resolve_identity(frame, &bbox);
            let tracker = self.tracker_factory.start(frame, &bbox);
            let label = identity.clone();
            let id = tracks.add(bbox, identity, tracker);
            log::info!("Track {id} ('{label}') created at {bbox:?}");
            created += 1;
        }
        Ok(created)
    }

    /// Identity for a fresh region; failures degrade to "Unknown"
    /// rather than aborting the cycle.
    fn resolve_identity(&mut self, frame: &Frame, bbox: &BoundingBox) -> String {
        match self.encoder.encode(frame, bbox) {
            Ok(Some(embedding)) => self.gallery.match_identity(&embedding, self.match_threshold),
            Ok(None) => UNKNOWN_LABEL.to_string(),
            Err(e) => {
                log::warn!("Embedding extraction failed for {bbox:?}: {e}");
                UNKNOWN_LABEL.to_string()
            }
        }
    }
}
