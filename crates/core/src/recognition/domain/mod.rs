pub mod face_encoder;
pub mod gallery;
pub mod gallery_store;
