use crate::pipeline::frame_source::FrameSource;
use crate::shared::frame::Frame;
use crate::tracking::domain::lifecycle::TrackLifecycleManager;
use crate::tracking::domain::track::{Track, TrackSet};

/// What one session run did, for logging and assertions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: usize,
    pub detection_passes: usize,
    pub tracks_created: usize,
}

/// Drives the per-frame cycle over a frame source.
///
/// Every frame: advance all live trackers, then — on every
/// `detection_interval`-th frame — run the full detection cycle against
/// the already-advanced track boxes, then hand the frame and the track
/// snapshot to the observer. The observer returns `false` to stop the
/// loop (the key-press exit lives outside the core).
///
/// Single-threaded and blocking throughout: each detector, encoder and
/// tracker call completes before the loop moves on. The detection
/// cycle's cost is amortized by the interval, not by parallelism.
pub struct TrackingSession {
    source: Box<dyn FrameSource>,
    lifecycle: TrackLifecycleManager,
    tracks: TrackSet,
    detection_interval: usize,
}

impl TrackingSession {
    pub fn new(
        source: Box<dyn FrameSource>,
        lifecycle: TrackLifecycleManager,
        detection_interval: usize,
    ) -> Result<Self, &'static str> {
        if detection_interval < 1 {
            return Err("detection interval must be >= 1");
        }
        Ok(Self {
            source,
            lifecycle,
            tracks: TrackSet::new(),
            detection_interval,
        })
    }

    /// Run until the stream ends, a read fails, or the observer asks to
    /// stop.
    ///
    /// The frame counter is incremented before the interval test, so
    /// the first detection pass lands on frame `detection_interval`,
    /// not frame one. A failed detection pass skips that cycle and the
    /// loop continues; a read failure ends the loop cleanly.
    pub fn run<F>(&mut self, mut observer: F) -> SessionSummary
    where
        F: FnMut(&Frame, &[Track]) -> bool,
    {
        let mut summary = SessionSummary::default();

        loop {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("End of stream after {} frame(s)", summary.frames);
                    break;
                }
                Err(e) => {
                    log::error!("Frame read failed: {e}");
                    break;
                }
            };
            summary.frames += 1;

            self.tracks.advance_all(&frame);

            if summary.frames % self.detection_interval == 0 {
                match self.lifecycle.reconcile(&frame, &mut self.tracks) {
                    Ok(created) => {
                        summary.detection_passes += 1;
                        summary.tracks_created += created;
                    }
                    Err(e) => log::warn!("Detection pass failed: {e}"),
                }
            }

            if !observer(&frame, self.tracks.tracks()) {
                log::info!("Stopped by observer at frame {}", summary.frames);
                break;
            }
        }

        summary
    }

    pub fn tracks(&self) -> &[Track] {
        self.tracks.tracks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::recognition::domain::face_encoder::FaceEncoder;
    use crate::recognition::domain::gallery::{Gallery, GalleryEntry};
    use crate::shared::bbox::BoundingBox;
    use crate::tracking::domain::visual_tracker::{TrackerFactory, VisualTracker};

    // --- Stubs ---

    struct VecSource {
        frames: Vec<Frame>,
        next: usize,
        fail_at: Option<usize>,
    }

    impl VecSource {
        fn new(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| Frame::new(vec![0u8; 50 * 50 * 3], 50, 50, 3, i))
                .collect();
            Self {
                frames,
                next: 0,
                fail_at: None,
            }
        }
    }

    impl FrameSource for VecSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            if self.fail_at == Some(self.next) {
                return Err("capture device unplugged".into());
            }
            let frame = self.frames.get(self.next).cloned();
            self.next += 1;
            Ok(frame)
        }
    }

    struct FixedDetector {
        boxes: Vec<BoundingBox>,
    }

    impl FaceDetector for FixedDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(self.boxes.clone())
        }
    }

    /// Encoder that returns a different embedding on every call.
    struct DriftingEncoder {
        embeddings: Vec<Vec<f32>>,
        call: usize,
    }

    impl FaceEncoder for DriftingEncoder {
        fn encode(
            &mut self,
            _frame: &Frame,
            _bbox: &BoundingBox,
        ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
            let embedding = self.embeddings[self.call.min(self.embeddings.len() - 1)].clone();
            self.call += 1;
            Ok(Some(embedding))
        }
    }

    struct StaticTracker {
        bbox: BoundingBox,
    }

    impl VisualTracker for StaticTracker {
        fn update(&mut self, _frame: &Frame) -> Option<BoundingBox> {
            Some(self.bbox)
        }
    }

    struct StaticTrackerFactory;

    impl TrackerFactory for StaticTrackerFactory {
        fn start(&self, _frame: &Frame, bbox: &BoundingBox) -> Box<dyn VisualTracker> {
            Box::new(StaticTracker { bbox: *bbox })
        }
    }

    fn lifecycle(boxes: Vec<BoundingBox>, embeddings: Vec<Vec<f32>>) -> TrackLifecycleManager {
        let gallery = Gallery::new(vec![
            GalleryEntry {
                label: "alice".to_string(),
                embedding: vec![1.0, 0.0],
            },
            GalleryEntry {
                label: "bob".to_string(),
                embedding: vec![0.0, 1.0],
            },
        ]);
        TrackLifecycleManager::new(
            Box::new(FixedDetector { boxes }),
            Box::new(DriftingEncoder {
                embeddings,
                call: 0,
            }),
            Box::new(StaticTrackerFactory),
            gallery,
            0.8,
            0.6,
        )
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(10, 10, 20, 20)
    }

    #[test]
    fn test_runs_until_end_of_stream() {
        let mut session = TrackingSession::new(
            Box::new(VecSource::new(7)),
            lifecycle(vec![], vec![]),
            3,
        )
        .unwrap();

        let summary = session.run(|_, _| true);

        assert_eq!(summary.frames, 7);
    }

    #[test]
    fn test_first_detection_pass_on_interval_frame() {
        let mut observed_counts = Vec::new();
        let mut session = TrackingSession::new(
            Box::new(VecSource::new(4)),
            lifecycle(vec![bbox()], vec![vec![1.0, 0.0]]),
            3,
        )
        .unwrap();

        session.run(|_, tracks| {
            observed_counts.push(tracks.len());
            true
        });

        // No tracks on frames 1-2; the pass on frame 3 creates one.
        assert_eq!(observed_counts, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_detection_passes_counted() {
        let mut session = TrackingSession::new(
            Box::new(VecSource::new(10)),
            lifecycle(vec![bbox()], vec![vec![1.0, 0.0]]),
            3,
        )
        .unwrap();

        let summary = session.run(|_, _| true);

        // Passes at frames 3, 6, 9; only the first creates a track.
        assert_eq!(summary.detection_passes, 3);
        assert_eq!(summary.tracks_created, 1);
    }

    #[test]
    fn test_observer_false_stops_loop() {
        let mut session = TrackingSession::new(
            Box::new(VecSource::new(100)),
            lifecycle(vec![], vec![]),
            30,
        )
        .unwrap();

        let summary = session.run(|frame, _| frame.index() < 4);

        assert_eq!(summary.frames, 5);
    }

    #[test]
    fn test_read_failure_ends_loop_cleanly() {
        let mut source = VecSource::new(10);
        source.fail_at = Some(4);
        let mut session =
            TrackingSession::new(Box::new(source), lifecycle(vec![], vec![]), 30).unwrap();

        let summary = session.run(|_, _| true);

        assert_eq!(summary.frames, 4);
    }

    #[test]
    fn test_identity_persists_between_detection_passes() {
        // Pass at frame 5 binds "alice". By the pass at frame 10 the
        // encoder would say "bob", but the existing track already
        // overlaps the detection, so no re-evaluation happens.
        let mut session = TrackingSession::new(
            Box::new(VecSource::new(12)),
            lifecycle(vec![bbox()], vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
            5,
        )
        .unwrap();

        let mut identities_seen = Vec::new();
        session.run(|_, tracks| {
            for t in tracks {
                identities_seen.push((t.id(), t.identity().to_string()));
            }
            true
        });

        assert!(identities_seen.iter().all(|(id, name)| *id == 0 && name == "alice"));
        // Track present from frame 5 through frame 12.
        assert_eq!(identities_seen.len(), 8);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result =
            TrackingSession::new(Box::new(VecSource::new(1)), lifecycle(vec![], vec![]), 0);
        assert!(result.is_err());
    }
}
