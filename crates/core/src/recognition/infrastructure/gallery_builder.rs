use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::recognition::domain::face_encoder::FaceEncoder;
use crate::recognition::domain::gallery::{Gallery, GalleryEntry};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Builds a gallery from a directory of labeled reference images.
///
/// Each image file contributes one entry: the label is the file stem
/// ("alice.jpg" → "alice"), the embedding comes from the first face the
/// detector finds in the image. Files that fail to decode or have no
/// detectable or encodable face are skipped with a warning so one bad
/// photo doesn't abort the rebuild. Files are visited in sorted name order, which fixes gallery
/// entry order and therefore match tie-breaking.
pub fn build_from_directory(
    dir: &Path,
    detector: &mut dyn FaceDetector,
    encoder: &mut dyn FaceEncoder,
) -> Result<Gallery, Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("{} is not a directory", dir.display()).into());
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_image(p))
        .collect();
    paths.sort();

    let mut entries = Vec::new();
    for path in paths {
        let Some(label) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let frame = match decode_image(&path) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("Could not decode {}, skipping: {err}", path.display());
                continue;
            }
        };

        let faces = detector.detect(&frame)?;
        let Some(bbox) = faces.first() else {
            log::warn!("No face found in {}, skipping", path.display());
            continue;
        };
        let Some(embedding) = encoder.encode(&frame, bbox)? else {
            log::warn!("Could not encode face in {}, skipping", path.display());
            continue;
        };

        log::info!("Gallery entry '{}' from {}", label, path.display());
        entries.push(GalleryEntry {
            label: label.to_string(),
            embedding,
        });
    }

    Ok(Gallery::new(entries))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn decode_image(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height, 3, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bbox::BoundingBox;
    use tempfile::TempDir;

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

    struct CountingEncoder {
        calls: usize,
    }

    impl FaceEncoder for CountingEncoder {
        fn encode(
            &mut self,
            _frame: &Frame,
            _bbox: &BoundingBox,
        ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
            self.calls += 1;
            Ok(Some(vec![self.calls as f32]))
        }
    }

    struct NoneEncoder;

    impl FaceEncoder for NoneEncoder {
        fn encode(
            &mut self,
            _frame: &Frame,
            _bbox: &BoundingBox,
        ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
            Ok(None)
        }
    }

    fn write_png(dir: &Path, name: &str) {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([100, 150, 200]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_labels_come_from_file_stems_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "bob.png");
        write_png(tmp.path(), "alice.png");

        let mut detector = FixedDetector {
            boxes: vec![BoundingBox::new(1, 1, 4, 4)],
        };
        let mut encoder = CountingEncoder { calls: 0 };

        let gallery = build_from_directory(tmp.path(), &mut detector, &mut encoder).unwrap();

        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.entries()[0].label, "alice");
        assert_eq!(gallery.entries()[1].label, "bob");
    }

    #[test]
    fn test_image_without_face_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "empty.png");

        let mut detector = FixedDetector { boxes: vec![] };
        let mut encoder = CountingEncoder { calls: 0 };

        let gallery = build_from_directory(tmp.path(), &mut detector, &mut encoder).unwrap();

        assert!(gallery.is_empty());
        assert_eq!(encoder.calls, 0);
    }

    #[test]
    fn test_unencodable_face_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "blurry.png");

        let mut detector = FixedDetector {
            boxes: vec![BoundingBox::new(1, 1, 4, 4)],
        };
        let mut encoder = NoneEncoder;

        let gallery = build_from_directory(tmp.path(), &mut detector, &mut encoder).unwrap();

        assert!(gallery.is_empty());
    }

    #[test]
    fn test_undecodable_image_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "dave.png");
        std::fs::write(tmp.path().join("corrupt.png"), b"not a png").unwrap();

        let mut detector = FixedDetector {
            boxes: vec![BoundingBox::new(1, 1, 4, 4)],
        };
        let mut encoder = CountingEncoder { calls: 0 };

        let gallery = build_from_directory(tmp.path(), &mut detector, &mut encoder).unwrap();

        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.entries()[0].label, "dave");
    }

    #[test]
    fn test_non_image_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "carol.png");
        std::fs::write(tmp.path().join("notes.txt"), "not an image").unwrap();

        let mut detector = FixedDetector {
            boxes: vec![BoundingBox::new(1, 1, 4, 4)],
        };
        let mut encoder = CountingEncoder { calls: 0 };

        let gallery = build_from_directory(tmp.path(), &mut detector, &mut encoder).unwrap();

        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.entries()[0].label, "carol");
    }

    #[test]
    fn test_missing_directory_is_error() {
        let mut detector = FixedDetector { boxes: vec![] };
        let mut encoder = CountingEncoder { calls: 0 };

        let result =
            build_from_directory(Path::new("/nonexistent/dir"), &mut detector, &mut encoder);

        assert!(result.is_err());
    }
}
