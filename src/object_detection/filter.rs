//! Candidate boxes to scored detections on the original image.

use ndarray::{Array2, ArrayView1, Axis};

use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use crate::image_utils::letterbox::Letterbox;
use crate::object_detection::decode::BOX_CHANNELS;

/// Convert the candidate arena into detections in original-image pixels.
///
/// Each candidate is converted to corner form, mapped through the inverse
/// letterbox transform, and clipped to the image. A box that inverts to
/// outside the image is collapsed to zero rather than dropped in place; the
/// area filter below then removes it. Survivors keep their strongest class
/// and must score strictly above `score_threshold`.
pub fn filter_boxes(
    candidates: &Array2<f32>,
    original_width: u32,
    original_height: u32,
    input_size: u32,
    score_threshold: f32,
) -> Vec<Detection> {
    let letterbox = Letterbox::new(original_width, original_height, input_size);
    let max_x = original_width as f32 - 1.0;
    let max_y = original_height as f32 - 1.0;

    let mut detections = Vec::new();
    for row in candidates.axis_iter(Axis(0)) {
        let (cx, cy, width, height) = (row[0], row[1], row[2], row[3]);
        let (xmin, ymin) = letterbox.invert(cx - width / 2.0, cy - height / 2.0);
        let (xmax, ymax) = letterbox.invert(cx + width / 2.0, cy + height / 2.0);

        let mut bbox = BoundingBox::new(
            xmin.max(0.0),
            ymin.max(0.0),
            xmax.min(max_x),
            ymax.min(max_y),
        );
        if bbox.xmin > bbox.xmax || bbox.ymin > bbox.ymax {
            bbox = BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        }

        // The scale filter has no upper bound; only exactly-degenerate
        // boxes fail it.
        let scale = bbox.area().sqrt();
        if scale <= 0.0 {
            continue;
        }

        let (class_id, class_prob) = best_class(&row);
        let score = row[4] * class_prob;
        if score > score_threshold {
            detections.push(Detection {
                bbox,
                score,
                class_id,
            });
        }
    }
    detections
}

/// Index and probability of the strongest class channel.
fn best_class(row: &ArrayView1<f32>) -> (usize, f32) {
    row.iter()
        .skip(BOX_CHANNELS)
        .copied()
        .enumerate()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .unwrap_or((0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn candidate_on_unpadded_image_keeps_its_coordinates() {
        // 416x416 original: the letterbox is the identity.
        let candidates = arr2(&[[208.0, 208.0, 100.0, 100.0, 1.0, 0.9, 0.1]]);
        let detections = filter_boxes(&candidates, 416, 416, 416, 0.25);
        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert_eq!(det.class_id, 0);
        assert!((det.score - 0.9).abs() < 1e-6);
        assert_eq!(det.bbox, BoundingBox::new(158.0, 158.0, 258.0, 258.0));
    }

    #[test]
    fn letterbox_padding_is_undone() {
        // 832x416 original at input 416: ratio 0.5, vertical pad 104. The
        // input-space center (208, 208) maps back to (416, 208).
        let candidates = arr2(&[[208.0, 208.0, 52.0, 52.0, 1.0, 0.8]]);
        let detections = filter_boxes(&candidates, 832, 416, 416, 0.25);
        assert_eq!(detections.len(), 1);
        let bbox = detections[0].bbox;
        assert!((bbox.xmin - 364.0).abs() < 1e-3);
        assert!((bbox.xmax - 468.0).abs() < 1e-3);
        assert!((bbox.ymin - 156.0).abs() < 1e-3);
        assert!((bbox.ymax - 260.0).abs() < 1e-3);
    }

    #[test]
    fn strongest_class_wins() {
        let candidates = arr2(&[[100.0, 100.0, 50.0, 50.0, 1.0, 0.2, 0.7, 0.05]]);
        let detections = filter_boxes(&candidates, 416, 416, 416, 0.25);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 1);
        assert!((detections[0].score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn objectness_scales_the_class_probability() {
        let candidates = arr2(&[[100.0, 100.0, 50.0, 50.0, 0.5, 0.8]]);
        let detections = filter_boxes(&candidates, 416, 416, 416, 0.25);
        assert_eq!(detections.len(), 1);
        assert!((detections[0].score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn box_fully_outside_the_image_is_dropped() {
        // Far off the right edge: clipping inverts the corner order, the box
        // is zeroed, and the area filter removes it.
        let candidates = arr2(&[[600.0, 208.0, 20.0, 20.0, 1.0, 0.99]]);
        let detections = filter_boxes(&candidates, 416, 416, 416, 0.25);
        assert!(detections.is_empty());
    }

    #[test]
    fn score_equal_to_threshold_is_excluded() {
        let at = arr2(&[[208.0, 208.0, 50.0, 50.0, 1.0, 0.25]]);
        assert!(filter_boxes(&at, 416, 416, 416, 0.25).is_empty());

        let above = arr2(&[[208.0, 208.0, 50.0, 50.0, 1.0, 0.2501]]);
        assert_eq!(filter_boxes(&above, 416, 416, 416, 0.25).len(), 1);
    }

    #[test]
    fn partially_outside_box_is_clipped_to_the_image() {
        let candidates = arr2(&[[10.0, 10.0, 40.0, 40.0, 1.0, 0.9]]);
        let detections = filter_boxes(&candidates, 416, 416, 416, 0.25);
        assert_eq!(detections.len(), 1);
        let bbox = detections[0].bbox;
        assert_eq!(bbox.xmin, 0.0);
        assert_eq!(bbox.ymin, 0.0);
        assert_eq!(bbox.xmax, 30.0);
        assert_eq!(bbox.ymax, 30.0);
    }
}
