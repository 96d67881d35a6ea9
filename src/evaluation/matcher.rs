//! Scoring detections against ground truth.

use crate::annotations::detection::Detection;
use crate::annotations::ground_truth::GroundTruthBox;
use crate::dataset::labels::LabelMap;

/// Overlap a detection must exceed (strictly) to claim a ground-truth box.
pub const MATCH_IOU_THRESHOLD: f32 = 0.5;

/// How many of an image's ground-truth boxes were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageScore {
    pub matched: usize,
    pub total: usize,
}

impl ImageScore {
    /// Fraction of ground-truth boxes detected, or `None` for an image with
    /// no ground truth. The caller reports those as missing rather than
    /// folding a made-up zero into its aggregate.
    pub fn accuracy(&self) -> Option<f32> {
        (self.total > 0).then(|| self.matched as f32 / self.total as f32)
    }
}

/// Count the ground-truth boxes claimed by at least one detection.
///
/// A ground-truth box is matched when some detection overlaps it with IoU
/// strictly above `iou_threshold` and resolves to the same category name.
/// Names, not ids: the detector's class order and the dataset's category
/// ids are independent spaces that only agree on names.
pub fn match_ground_truth(
    detections: &[Detection],
    ground_truth: &[GroundTruthBox],
    labels: &LabelMap,
    iou_threshold: f32,
) -> ImageScore {
    let matched = ground_truth
        .iter()
        .filter(|gt| {
            detections.iter().any(|det| {
                gt.bbox.intersection_over_union(&det.bbox) > iou_threshold
                    && labels.name_of(det.class_id) == Some(gt.category_name.as_str())
            })
        })
        .count();
    ImageScore {
        matched,
        total: ground_truth.len(),
    }
}
