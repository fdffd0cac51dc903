/// Correlation-based visual tracker.
///
/// Holds a grayscale template of the face region captured at track
/// creation and, each frame, searches a local window around the last
/// known position for the best normalized cross-correlation response.
/// The box keeps its original size; only the position moves. When the
/// best response drops below the score floor the target is reported
/// lost, which removes the owning track.
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;
use crate::tracking::domain::visual_tracker::{TrackerFactory, VisualTracker};

/// Template and candidate windows are compared on a coarse sample grid
/// to keep the per-frame cost independent of face size.
const GRID_SIZE: usize = 24;

pub const DEFAULT_SEARCH_RADIUS: i32 = 16;
pub const DEFAULT_MIN_SCORE: f32 = 0.4;

pub struct TemplateTracker {
    /// Grayscale template sampled at creation; `None` when the initial
    /// region could not be sampled, in which case the first update
    /// reports loss.
    template: Option<Vec<f32>>,
    bbox: BoundingBox,
    search_radius: i32,
    min_score: f32,
}

impl TemplateTracker {
    pub fn start(
        frame: &Frame,
        bbox: &BoundingBox,
        search_radius: i32,
        min_score: f32,
    ) -> Self {
        Self {
            template: sample_gray(frame, bbox.x, bbox.y, bbox.width, bbox.height),
            bbox: *bbox,
            search_radius,
            min_score,
        }
    }
}

impl VisualTracker for TemplateTracker {
    fn update(&mut self, frame: &Frame) -> Option<BoundingBox> {
        let template = self.template.as_ref()?;

        let mut best_score = f32::NEG_INFINITY;
        let mut best_pos = (self.bbox.x, self.bbox.y);
        for dy in -self.search_radius..=self.search_radius {
            for dx in -self.search_radius..=self.search_radius {
                let x = self.bbox.x + dx;
                let y = self.bbox.y + dy;
                let Some(candidate) = sample_gray(frame, x, y, self.bbox.width, self.bbox.height)
                else {
                    continue;
                };
                let score = ncc(template, &candidate);
                if score > best_score {
                    best_score = score;
                    best_pos = (x, y);
                }
            }
        }

        if best_score < self.min_score {
            return None;
        }
        self.bbox.x = best_pos.0;
        self.bbox.y = best_pos.1;
        Some(self.bbox)
    }
}

pub struct TemplateTrackerFactory {
    search_radius: i32,
    min_score: f32,
}

impl TemplateTrackerFactory {
    pub fn new(search_radius: i32, min_score: f32) -> Self {
        Self {
            search_radius,
            min_score,
        }
    }
}

impl Default for TemplateTrackerFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_RADIUS, DEFAULT_MIN_SCORE)
    }
}

impl TrackerFactory for TemplateTrackerFactory {
    fn start(&self, frame: &Frame, bbox: &BoundingBox) -> Box<dyn VisualTracker> {
        Box::new(TemplateTracker::start(
            frame,
            bbox,
            self.search_radius,
            self.min_score,
        ))
    }
}

/// Grayscale values of the region on a `GRID_SIZE`² nearest-neighbor
/// grid. `None` when the region is degenerate or not fully inside the
/// frame; a partially visible candidate cannot be compared fairly.
fn sample_gray(frame: &Frame, x: i32, y: i32, width: i32, height: i32) -> Option<Vec<f32>> {
    if width <= 0 || height <= 0 || x < 0 || y < 0 {
        return None;
    }
    if (x + width) as u32 > frame.width() || (y + height) as u32 > frame.height() {
        return None;
    }

    let ch = frame.channels() as usize;
    let data = frame.data();
    let frame_w = frame.width() as usize;

    let grid_w = GRID_SIZE.min(width as usize);
    let grid_h = GRID_SIZE.min(height as usize);

    let mut samples = Vec::with_capacity(grid_w * grid_h);
    for gy in 0..grid_h {
        let src_y = y as usize + gy * height as usize / grid_h;
        for gx in 0..grid_w {
            let src_x = x as usize + gx * width as usize / grid_w;
            let offset = (src_y * frame_w + src_x) * ch;
            let pixel = &data[offset..offset + ch];
            let gray = pixel.iter().map(|&b| b as f32).sum::<f32>() / ch as f32;
            samples.push(gray);
        }
    }
    Some(samples)
}

/// Normalized cross-correlation in `[-1, 1]`.
///
/// Zero-variance windows (flat background) score 0 rather than
/// dividing by zero; a flat candidate can never beat a textured match.
fn ncc(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len() as f32;
    let mean_a = a.iter().sum::<f32>() / n;
    let mean_b = b.iter().sum::<f32>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    cov / denom
}
