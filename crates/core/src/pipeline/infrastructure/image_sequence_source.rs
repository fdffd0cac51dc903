use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::frame_source::FrameSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ImageSequenceError {
    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },
    #[error("no image files found in {path}")]
    Empty { path: PathBuf },
    #[error("failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Frame source over a directory of still images, visited in sorted
/// name order.
///
/// Stands in for live capture (which stays outside the core): a
/// recorded sequence exercises the exact same loop. Decode failures
/// surface as read errors, which end the session.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self, ImageSequenceError> {
        if !dir.is_dir() {
            return Err(ImageSequenceError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        let entries = std::fs::read_dir(dir).map_err(|e| ImageSequenceError::List {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_image(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(ImageSequenceError::Empty {
                path: dir.to_path_buf(),
            });
        }
        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let index = self.next;
        self.next += 1;

        let rgb = image::open(path)
            .map_err(|e| ImageSequenceError::Decode {
                path: path.clone(),
                source: e,
            })?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Some(Frame::new(rgb.into_raw(), width, height, 3, index)))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
