pub mod arcface_encoder;
pub mod gallery_builder;
pub mod json_gallery_store;
