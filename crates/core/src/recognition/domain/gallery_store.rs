use crate::recognition::domain::gallery::Gallery;

/// Persistence seam for the identity gallery.
///
/// Implementations handle the storage format; the session only loads
/// once at startup and saves after a rebuild.
pub trait GalleryStore {
    fn load(&self) -> Result<Gallery, Box<dyn std::error::Error>>;
    fn save(&self, gallery: &Gallery) -> Result<(), Box<dyn std::error::Error>>;
}
