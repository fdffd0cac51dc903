use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::gallery_store::GalleryStore;

#[derive(Error, Debug)]
pub enum GalleryStoreError {
    #[error("gallery file {path} does not exist; run with --rebuild-gallery to create it")]
    Missing { path: PathBuf },
    #[error("failed to read gallery from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write gallery to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("gallery file {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Stores the gallery as a JSON file of `(label, embedding)` entries.
///
/// A missing file on load is its own error variant so the CLI can point
/// the user at the rebuild flag before the loop ever starts.
pub struct JsonGalleryStore {
    path: PathBuf,
}

impl JsonGalleryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl GalleryStore for JsonGalleryStore {
    fn load(&self) -> Result<Gallery, Box<dyn std::error::Error>> {
        if !self.path.exists() {
            return Err(GalleryStoreError::Missing {
                path: self.path.clone(),
            }
            .into());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| GalleryStoreError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        let gallery = serde_json::from_str(&text).map_err(|e| GalleryStoreError::Format {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(gallery)
    }

    fn save(&self, gallery: &Gallery) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| GalleryStoreError::Write {
                    path: self.path.clone(),
                    source: e,
                })?;
            }
        }
        let text = serde_json::to_string_pretty(gallery)?;
        fs::write(&self.path, text).map_err(|e| GalleryStoreError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::gallery::GalleryEntry;
    use tempfile::TempDir;

    fn gallery() -> Gallery {
        Gallery::new(vec![
            GalleryEntry {
                label: "alice".to_string(),
                embedding: vec![0.1, 0.2, 0.3],
            },
            GalleryEntry {
                label: "bob".to_string(),
                embedding: vec![0.9, 0.8, 0.7],
            },
        ])
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonGalleryStore::new(tmp.path().join("gallery.json"));

        store.save(&gallery()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, gallery());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = JsonGalleryStore::new(tmp.path().join("nested/dir/gallery.json"));

        store.save(&gallery()).unwrap();

        assert!(store.load().is_ok());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let store = JsonGalleryStore::new(tmp.path().join("absent.json"));

        let err = store.load().unwrap_err().to_string();

        assert!(err.contains("rebuild-gallery"), "unexpected error: {err}");
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "not json at all").unwrap();
        let store = JsonGalleryStore::new(path);

        let err = store.load().unwrap_err().to_string();

        assert!(err.contains("not valid JSON"), "unexpected error: {err}");
    }

    #[test]
    fn test_entry_order_survives_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonGalleryStore::new(tmp.path().join("gallery.json"));

        store.save(&gallery()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.entries()[0].label, "alice");
        assert_eq!(loaded.entries()[1].label, "bob");
    }
}
