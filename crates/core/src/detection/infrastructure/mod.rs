pub mod downscaled_detector;
pub mod onnx_yolo_detector;
