use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;
use crate::tracking::domain::visual_tracker::VisualTracker;

/// One face being followed across frames.
///
/// The identity is resolved exactly once, when the track is created;
/// it never changes while the track lives. The embedded tracker is the
/// only thing that moves the box.
pub struct Track {
    id: u64,
    bbox: BoundingBox,
    identity: String,
    tracker: Box<dyn VisualTracker>,
}

impl Track {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Owns all live tracks and their per-frame advancement.
///
/// Track ids are monotonic for the process lifetime; a removed id is
/// never reused, so downstream consumers can key state by id safely.
#[derive(Default)]
pub struct TrackSet {
    tracks: Vec<Track>,
    next_id: u64,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Advance every live track to the current frame.
    ///
    /// Two-phase removal: failures are collected during the scan and
    /// compacted out afterwards, so the update loop never mutates the
    /// collection it is iterating.
    pub fn advance_all(&mut self, frame: &Frame) {
        let mut lost: Vec<u64> = Vec::new();
        for track in &mut self.tracks {
            match track.tracker.update(frame) {
                Some(bbox) => track.bbox = bbox,
                None => lost.push(track.id),
            }
        }
        if !lost.is_empty() {
            log::debug!("Lost {} track(s): {lost:?}", lost.len());
            self.tracks.retain(|t| !lost.contains(&t.id));
        }
    }

    /// Whether `bbox` already corresponds to a live track.
    ///
    /// True when some track overlaps it above `iou_threshold`, or when
    /// `bbox` sits entirely inside a track's box. The reverse
    /// containment (track inside detection) deliberately does not
    /// count; a strictly larger re-detection spawns a duplicate track
    /// rather than silently replacing the existing one.
    pub fn overlaps_any(&self, bbox: &BoundingBox, iou_threshold: f64) -> bool {
        self.tracks.iter().any(|track| {
            track.bbox.iou(bbox) > iou_threshold || bbox.is_contained_in(&track.bbox)
        })
    }

    /// Register a new track and return its id.
    pub fn add(
        &mut self,
        bbox: BoundingBox,
        identity: String,
        tracker: Box<dyn VisualTracker>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tracks.push(Track {
            id,
            bbox,
            identity,
            tracker,
        });
        id
    }
}
