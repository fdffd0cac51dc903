/// ArcFace embedding extraction using ONNX Runtime.
///
/// Crops the face region, resamples it to the model's 112x112 input,
/// and L2-normalizes the output so Euclidean distances between
/// embeddings are directly comparable across sessions.
use std::path::Path;

use crate::recognition::domain::face_encoder::{Embedding, FaceEncoder};
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

/// Regions smaller than this on either side carry no usable face signal.
const MIN_CROP_SIDE: u32 = 8;

pub struct ArcFaceEncoder {
    session: ort::session::Session,
}

impl ArcFaceEncoder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;
        Ok(Self { session })
    }
}

impl FaceEncoder for ArcFaceEncoder {
    fn encode(
        &mut self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<Option<Embedding>, Box<dyn std::error::Error>> {
        let Some(crop) = frame.crop(bbox) else {
            return Ok(None);
        };
        if crop.width() < MIN_CROP_SIDE || crop.height() < MIN_CROP_SIDE {
            return Ok(None);
        }

        let tensor = preprocess(crop.data(), crop.width(), crop.height());
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(Some(embedding))
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
