mod annotations;
mod dataset;
mod evaluation;
mod image_utils;
mod object_detection;
mod visualization;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::dataset::coco::CocoDataset;
use crate::dataset::labels::LabelMap;
use crate::evaluation::matcher::{MATCH_IOU_THRESHOLD, match_ground_truth};
use crate::evaluation::report::{EvalAccumulator, mean_confidence};
use crate::image_utils::image_io::read_image_as_rgb8;
use crate::image_utils::letterbox::letterbox_image;
use crate::object_detection::anchors::AnchorSet;
use crate::object_detection::config::{DecodeMode, PipelineConfig, SuppressionMethod};
use crate::object_detection::decode::decode_predictions;
use crate::object_detection::filter::filter_boxes;
use crate::object_detection::nms::non_maximum_suppression;
use crate::object_detection::yolov4::Yolov4Model;
use crate::visualization::draw::draw_detections;

const ANCHORS_PER_SCALE: usize = 3;

/// Run an object-detection model over a COCO-annotated image set and report
/// accuracy, confidence and throughput.
#[derive(Debug, Parser)]
#[command(name = "detector-eval")]
struct Args {
    /// Path of the ONNX model.
    #[arg(short, long)]
    model: PathBuf,

    /// Directory holding the input images.
    #[arg(short, long)]
    input: PathBuf,

    /// COCO annotation JSON file.
    #[arg(short, long)]
    annotation: PathBuf,

    /// Class names file, one name per line, in detector output order.
    #[arg(long, default_value = "coco.names")]
    classes: PathBuf,

    /// Anchor file: one line of comma-separated floats.
    #[arg(long, default_value = "yolov4_anchors.txt")]
    anchors: PathBuf,

    /// Process only the last N images, for quick runs.
    #[arg(short, long)]
    stop: Option<usize>,

    /// The model is the quantized graph with a bundled decode head.
    #[arg(short, long)]
    quantized: bool,

    /// Suppression method: `nms` or `soft-nms`.
    #[arg(long, default_value = "nms")]
    suppression: SuppressionMethod,

    /// Directory to save rendered detections into.
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = PipelineConfig {
        method: args.suppression,
        mode: if args.quantized {
            DecodeMode::Quantized
        } else {
            DecodeMode::Full
        },
        ..PipelineConfig::default()
    };

    let dataset = CocoDataset::from_file(&args.annotation)
        .with_context(|| format!("loading annotations from {}", args.annotation.display()))?;
    let labels = LabelMap::from_file(&args.classes, config.mode.class_index_offset())
        .with_context(|| format!("loading class names from {}", args.classes.display()))?;
    let anchors = AnchorSet::from_file(&args.anchors, config.strides.len(), ANCHORS_PER_SCALE)
        .with_context(|| format!("loading anchors from {}", args.anchors.display()))?;
    let model = Yolov4Model::new(&args.model)
        .with_context(|| format!("loading model from {}", args.model.display()))?;

    if let Some(dir) = &args.save {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    let skip = args
        .stop
        .map_or(0, |stop| dataset.images.len().saturating_sub(stop));
    info!(images = dataset.images.len() - skip, "starting evaluation");

    let mut accumulator = EvalAccumulator::new();
    for image_info in dataset.images.iter().skip(skip) {
        let image_path = args.input.join(&image_info.file_name);
        let image = match read_image_as_rgb8(&image_path) {
            Ok(image) => image,
            Err(err) => {
                warn!(path = %image_path.display(), %err, "skipping unreadable image");
                continue;
            }
        };

        let input = letterbox_image(&image, config.input_size);
        let start = Instant::now();
        let raw_outputs = model
            .run(&input)
            .with_context(|| format!("inference failed on {}", image_info.file_name))?;
        let elapsed = start.elapsed();

        let candidates = decode_predictions(&raw_outputs, &anchors, &config)?;
        let detections = filter_boxes(
            &candidates,
            image.width(),
            image.height(),
            config.input_size,
            config.score_threshold,
        );
        let detections = non_maximum_suppression(detections, config.iou_threshold, config.method);

        let ground_truth = dataset.ground_truth_for_image(image_info.id)?;
        let score = match_ground_truth(&detections, &ground_truth, &labels, MATCH_IOU_THRESHOLD);

        let fps = 1.0 / elapsed.as_secs_f32().max(f32::EPSILON);
        debug!(
            image = %image_info.file_name,
            detections = detections.len(),
            matched = score.matched,
            ground_truth = score.total,
            "processed"
        );
        accumulator.record(mean_confidence(&detections), score.accuracy(), fps);

        if let Some(dir) = &args.save {
            let mut rendered = image;
            draw_detections(&mut rendered, &detections, labels.len());
            rendered
                .save(dir.join(format!("{}.jpg", image_info.id)))
                .with_context(|| format!("saving rendering for image {}", image_info.id))?;
        }
    }

    let summary = accumulator.summary();
    info!(%summary, "evaluation finished");
    println!("{summary}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::ground_truth::GroundTruthBox;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn one_strong_activation_survives_the_whole_pipeline() {
        let anchors = AnchorSet::parse("12,16, 19,36, 40,28", 1, 3).unwrap();
        let config = PipelineConfig {
            strides: vec![32.0],
            xy_scales: vec![1.05],
            ..PipelineConfig::default()
        };

        // One COCO-shaped scale with a single confident class-0 hit at grid
        // cell (6, 6), anchor 0. Everything else scores 0 and is filtered.
        let mut pred = ArrayD::<f32>::zeros(IxDyn(&[1, 13, 13, 3, 85]));
        pred[[0, 6, 6, 0, 4]] = 1.0;
        pred[[0, 6, 6, 0, 5]] = 0.99;

        let candidates = decode_predictions(&[pred], &anchors, &config).unwrap();
        let detections = filter_boxes(&candidates, 416, 416, config.input_size, config.score_threshold);
        let detections = non_maximum_suppression(detections, config.iou_threshold, config.method);

        assert_eq!(detections.len(), 1);
        let detection = &detections[0];
        assert_eq!(detection.class_id, 0);
        assert!((detection.score - 0.99).abs() < 1e-5);
        // The square image needs no letterbox correction, so the box stays
        // centered on (208, 208) with the anchor-0 prior size.
        assert!((detection.bbox.xmin - 202.0).abs() < 1e-2);
        assert!((detection.bbox.xmax - 214.0).abs() < 1e-2);
        assert!((detection.bbox.ymin - 200.0).abs() < 1e-2);
        assert!((detection.bbox.ymax - 216.0).abs() < 1e-2);

        let labels = LabelMap::new(vec!["person".to_string()], 0);
        let ground_truth = vec![GroundTruthBox::from_xywh(
            "person".to_string(),
            202.0,
            200.0,
            12.0,
            16.0,
        )];
        let score = match_ground_truth(&detections, &ground_truth, &labels, MATCH_IOU_THRESHOLD);
        assert_eq!(score.matched, 1);
        assert_eq!(score.accuracy(), Some(1.0));
    }
}
