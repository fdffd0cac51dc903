pub mod detection_filter;
pub mod face_detector;
