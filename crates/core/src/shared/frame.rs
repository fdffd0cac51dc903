use ndarray::ArrayView3;

use crate::shared::bbox::BoundingBox;

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the tracking and
/// recognition layers treat pixel data as opaque except through the
/// views and resampling helpers below.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of this frame in the stream, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Nearest-neighbor downscale by an integer factor.
    ///
    /// Used to cheapen the periodic detection pass; resulting boxes are
    /// mapped back with `BoundingBox::scaled`. Factor must be >= 1 and
    /// small enough to leave at least one pixel per axis.
    pub fn downscaled(&self, factor: u32) -> Frame {
        if factor <= 1 {
            return self.clone();
        }
        let dst_w = (self.width / factor).max(1);
        let dst_h = (self.height / factor).max(1);
        let ch = self.channels as usize;

        let mut data = Vec::with_capacity(dst_w as usize * dst_h as usize * ch);
        for y in 0..dst_h {
            let src_y = (y * factor).min(self.height - 1) as usize;
            for x in 0..dst_w {
                let src_x = (x * factor).min(self.width - 1) as usize;
                let offset = (src_y * self.width as usize + src_x) * ch;
                data.extend_from_slice(&self.data[offset..offset + ch]);
            }
        }
        Frame::new(data, dst_w, dst_h, self.channels, self.index)
    }

    /// Copy of the pixels under `bbox`, clamped to the frame bounds.
    ///
    /// Returns `None` when the clamped region is empty (box entirely
    /// outside the frame or degenerate).
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let x1 = bbox.x.max(0) as u32;
        let y1 = bbox.y.max(0) as u32;
        let x2 = (bbox.x2().max(0) as u32).min(self.width);
        let y2 = (bbox.y2().max(0) as u32).min(self.height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let ch = self.channels as usize;
        let crop_w = (x2 - x1) as usize;
        let mut data = Vec::with_capacity(crop_w * (y2 - y1) as usize * ch);
        for y in y1..y2 {
            let row_start = (y as usize * self.width as usize + x1 as usize) * ch;
            data.extend_from_slice(&self.data[row_start..row_start + crop_w * ch]);
        }
        Some(Frame::new(data, x2 - x1, y2 - y1, self.channels, self.index))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
