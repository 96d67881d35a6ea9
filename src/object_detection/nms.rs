//! Per-class non-maximum suppression.

use std::collections::BTreeMap;

use crate::annotations::detection::Detection;
use crate::object_detection::config::SuppressionMethod;

/// Reduce overlapping same-class detections to the strongest ones.
///
/// Classes are suppressed independently. Within a class the remaining
/// highest-scored box is kept (ties go to the earliest in input order),
/// then every other remaining box's score is re-weighted against it and
/// boxes whose score falls to 0 drop out. Hard NMS zeroes any box
/// overlapping the kept one beyond `iou_threshold`; soft NMS decays all
/// remaining scores by `exp(-iou^2 / sigma)` instead.
///
/// The returned order groups boxes by class and is otherwise not
/// meaningful.
pub fn non_maximum_suppression(
    detections: Vec<Detection>,
    iou_threshold: f32,
    method: SuppressionMethod,
) -> Vec<Detection> {
    let mut by_class: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
    for detection in detections {
        by_class.entry(detection.class_id).or_default().push(detection);
    }

    let mut kept = Vec::new();
    for (_, mut group) in by_class {
        while !group.is_empty() {
            // `remove`, not `swap_remove`: the remaining order carries the
            // tie-break for later rounds.
            let best = group.remove(argmax_score(&group));
            for other in &mut group {
                let iou = best.bbox.intersection_over_union(&other.bbox);
                let weight = match method {
                    SuppressionMethod::Nms => {
                        if iou > iou_threshold {
                            0.0
                        } else {
                            1.0
                        }
                    }
                    SuppressionMethod::SoftNms { sigma } => (-(iou * iou) / sigma).exp(),
                };
                other.score *= weight;
            }
            group.retain(|detection| detection.score > 0.0);
            kept.push(best);
        }
    }
    kept
}

/// Index of the highest score; the strict comparison keeps the first of any
/// tied maxima.
fn argmax_score(group: &[Detection]) -> usize {
    let mut best = 0;
    for (index, detection) in group.iter().enumerate() {
        if detection.score > group[best].score {
            best = index;
        }
    }
    best
}
