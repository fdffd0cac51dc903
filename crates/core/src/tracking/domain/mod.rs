pub mod lifecycle;
pub mod track;
pub mod visual_tracker;
