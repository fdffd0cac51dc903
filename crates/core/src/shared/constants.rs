pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Frames between full detection passes (~1 second at 30 fps).
pub const DETECTION_INTERVAL: usize = 30;

/// Overlap ratio above which a detection is considered already tracked.
pub const IOU_THRESHOLD: f64 = 0.8;

/// Maximum embedding distance for a positive identity match.
pub const MATCH_THRESHOLD: f32 = 0.6;

/// Integer factor by which frames are shrunk for the detection pass.
pub const DOWNSCALE_FACTOR: u32 = 4;

/// Identity assigned when no gallery entry is close enough, or when no
/// embedding could be extracted from a region.
pub const UNKNOWN_LABEL: &str = "Unknown";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
