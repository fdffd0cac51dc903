/// An axis-aligned face bounding box in integer pixel coordinates.
///
/// `x`/`y` are the top-left corner; `width`/`height` must be positive
/// for the geometry predicates below to be meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Right edge (exclusive).
    pub fn x2(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn y2(&self) -> i32 {
        self.y + self.height
    }

    /// Intersection-over-union with `other`, in `[0, 1]`.
    ///
    /// Symmetric; identical boxes score 1.0. A non-positive intersection
    /// width or height is checked before any area math so disjoint boxes
    /// score exactly 0.0.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.x2().min(other.x2());
        let iy2 = self.y2().min(other.y2());

        if ix2 <= ix1 || iy2 <= iy1 {
            return 0.0;
        }

        let inter = (ix2 - ix1) as f64 * (iy2 - iy1) as f64;
        let union = (self.area() + other.area()) as f64 - inter;
        inter / union
    }

    /// True iff `self` lies entirely inside `outer`, component-wise.
    ///
    /// Reflexive: every box contains itself. Not symmetric.
    pub fn is_contained_in(&self, outer: &BoundingBox) -> bool {
        self.x >= outer.x
            && self.y >= outer.y
            && self.x2() <= outer.x2()
            && self.y2() <= outer.y2()
    }

    /// Multiply all coordinates by `factor`.
    ///
    /// Maps a box detected on a downscaled frame back to full-frame
    /// coordinates.
    pub fn scaled(&self, factor: i32) -> BoundingBox {
        BoundingBox {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}
