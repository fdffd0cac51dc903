use std::path::PathBuf;
use std::process;

use clap::Parser;

use facetrack_core::detection::domain::face_detector::FaceDetector;
use facetrack_core::detection::infrastructure::downscaled_detector::DownscaledDetector;
use facetrack_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CONFIDENCE,
};
use facetrack_core::pipeline::infrastructure::image_sequence_source::ImageSequenceSource;
use facetrack_core::pipeline::session::TrackingSession;
use facetrack_core::recognition::domain::face_encoder::FaceEncoder;
use facetrack_core::recognition::domain::gallery::Gallery;
use facetrack_core::recognition::domain::gallery_store::GalleryStore;
use facetrack_core::recognition::infrastructure::arcface_encoder::ArcFaceEncoder;
use facetrack_core::recognition::infrastructure::gallery_builder;
use facetrack_core::recognition::infrastructure::json_gallery_store::JsonGalleryStore;
use facetrack_core::shared::constants::{
    DETECTION_INTERVAL, DOWNSCALE_FACTOR, EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL,
    IOU_THRESHOLD, MATCH_THRESHOLD, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use facetrack_core::shared::model_resolver;
use facetrack_core::tracking::domain::lifecycle::TrackLifecycleManager;
use facetrack_core::tracking::infrastructure::template_tracker::TemplateTrackerFactory;

/// Live face tracking and identification over a frame sequence.
#[derive(Parser)]
#[command(name = "facetrack")]
struct Cli {
    /// Directory of frames to process, in sorted name order.
    input: PathBuf,

    /// Path to the gallery file of known identities.
    #[arg(long, default_value = "gallery.json")]
    gallery: PathBuf,

    /// Rebuild the gallery from this directory of labeled images
    /// (label = file stem) before tracking starts.
    #[arg(long)]
    rebuild_gallery: Option<PathBuf>,

    /// Run the full detection pass every Nth frame.
    #[arg(long, default_value_t = DETECTION_INTERVAL)]
    detection_interval: usize,

    /// Overlap ratio above which a detection counts as already tracked.
    #[arg(long, default_value_t = IOU_THRESHOLD)]
    iou_threshold: f64,

    /// Maximum embedding distance for a positive identity match.
    #[arg(long, default_value_t = MATCH_THRESHOLD)]
    match_threshold: f32,

    /// Integer factor by which frames are shrunk for detection.
    #[arg(long, default_value_t = DOWNSCALE_FACTOR)]
    downscale: u32,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Directory with pre-downloaded ONNX models.
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let bundled = cli.models_dir.as_deref();
    let yolo_path = model_resolver::resolve(YOLO_MODEL_NAME, YOLO_MODEL_URL, bundled)?;
    let embed_path = model_resolver::resolve(EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, bundled)?;

    let mut detector: Box<dyn FaceDetector> =
        Box::new(OnnxYoloDetector::new(&yolo_path, cli.confidence)?);
    let mut encoder: Box<dyn FaceEncoder> = Box::new(ArcFaceEncoder::new(&embed_path)?);

    // Gallery load (or rebuild) happens before the loop; a missing
    // gallery without the rebuild flag aborts here.
    let store = JsonGalleryStore::new(cli.gallery.clone());
    let gallery = match &cli.rebuild_gallery {
        Some(images_dir) => {
            log::info!("Rebuilding gallery from {}", images_dir.display());
            let gallery =
                gallery_builder::build_from_directory(images_dir, &mut *detector, &mut *encoder)?;
            store.save(&gallery)?;
            log::info!(
                "Gallery with {} identit{} saved to {}",
                gallery.len(),
                if gallery.len() == 1 { "y" } else { "ies" },
                cli.gallery.display()
            );
            gallery
        }
        None => store.load()?,
    };
    report_gallery(&gallery);

    let detector = Box::new(DownscaledDetector::new(detector, cli.downscale)?);
    let lifecycle = TrackLifecycleManager::new(
        detector,
        encoder,
        Box::new(TemplateTrackerFactory::default()),
        gallery,
        cli.iou_threshold,
        cli.match_threshold,
    );

    let source = ImageSequenceSource::open(&cli.input)?;
    log::info!(
        "Tracking {} frame(s) from {}",
        source.len(),
        cli.input.display()
    );

    let mut session = TrackingSession::new(Box::new(source), lifecycle, cli.detection_interval)?;

    let max_frames = cli.max_frames;
    let summary = session.run(|frame, tracks| {
        for track in tracks {
            let b = track.bbox();
            println!(
                "frame {:>6}  track {:>3}  {:<20} x={} y={} w={} h={}",
                frame.index(),
                track.id(),
                track.identity(),
                b.x,
                b.y,
                b.width,
                b.height
            );
        }
        max_frames.map_or(true, |limit| frame.index() + 1 < limit)
    });

    log::info!(
        "Done: {} frame(s), {} detection pass(es), {} track(s) created",
        summary.frames,
        summary.detection_passes,
        summary.tracks_created
    );
    Ok(())
}

fn report_gallery(gallery: &Gallery) {
    if gallery.is_empty() {
        log::warn!("Gallery is empty; every face will be labeled Unknown");
        return;
    }
    let labels: Vec<&str> = gallery.entries().iter().map(|e| e.label.as_str()).collect();
    log::info!("Gallery loaded: {}", labels.join(", "));
}
