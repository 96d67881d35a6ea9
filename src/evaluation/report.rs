//! Aggregating per-image scalars into the run summary.

use std::fmt;

use crate::annotations::detection::Detection;

/// Mean score of one image's final detections, 0 when there are none.
pub fn mean_confidence(detections: &[Detection]) -> f32 {
    if detections.is_empty() {
        return 0.0;
    }
    detections.iter().map(|det| det.score).sum::<f32>() / detections.len() as f32
}

/// Collects one entry per processed image and reports the means.
///
/// Accuracy entries are optional: an image without ground truth contributes
/// nothing to the accuracy mean instead of skewing it with a zero.
#[derive(Debug, Default)]
pub struct EvalAccumulator {
    confidences: Vec<f32>,
    accuracies: Vec<f32>,
    frames_per_second: Vec<f32>,
}

impl EvalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, confidence: f32, accuracy: Option<f32>, fps: f32) {
        self.confidences.push(confidence);
        if let Some(accuracy) = accuracy {
            self.accuracies.push(accuracy);
        }
        self.frames_per_second.push(fps);
    }

    pub fn summary(&self) -> EvalSummary {
        EvalSummary {
            images: self.confidences.len(),
            scored_images: self.accuracies.len(),
            mean_confidence: mean(&self.confidences),
            mean_accuracy: mean(&self.accuracies),
            mean_fps: mean(&self.frames_per_second),
        }
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalSummary {
    pub images: usize,
    /// Images that had ground truth and therefore an accuracy.
    pub scored_images: usize,
    pub mean_confidence: f32,
    pub mean_accuracy: f32,
    pub mean_fps: f32,
}

impl fmt::Display for EvalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "images: {} ({} with ground truth), mConfidence: {:.6}, mAcc: {:.6}, mFPS: {:.6}",
            self.images, self.scored_images, self.mean_confidence, self.mean_accuracy, self.mean_fps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::bounding_box::BoundingBox;

    fn detection(score: f32) -> Detection {
        Detection {
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            score,
            class_id: 0,
        }
    }

    #[test]
    fn confidence_is_the_mean_detection_score() {
        let detections = vec![detection(0.5), detection(0.9)];
        assert!((mean_confidence(&detections) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn confidence_of_no_detections_is_zero() {
        assert_eq!(mean_confidence(&[]), 0.0);
    }

    #[test]
    fn summary_averages_each_series() {
        let mut accumulator = EvalAccumulator::new();
        accumulator.record(0.8, Some(1.0), 30.0);
        accumulator.record(0.4, Some(0.5), 20.0);
        let summary = accumulator.summary();
        assert_eq!(summary.images, 2);
        assert_eq!(summary.scored_images, 2);
        assert!((summary.mean_confidence - 0.6).abs() < 1e-6);
        assert!((summary.mean_accuracy - 0.75).abs() < 1e-6);
        assert!((summary.mean_fps - 25.0).abs() < 1e-4);
    }

    #[test]
    fn images_without_ground_truth_do_not_drag_accuracy_down() {
        let mut accumulator = EvalAccumulator::new();
        accumulator.record(0.8, Some(1.0), 30.0);
        accumulator.record(0.0, None, 30.0);
        let summary = accumulator.summary();
        assert_eq!(summary.images, 2);
        assert_eq!(summary.scored_images, 1);
        assert_eq!(summary.mean_accuracy, 1.0);
    }

    #[test]
    fn empty_run_reports_zeros() {
        let summary = EvalAccumulator::new().summary();
        assert_eq!(summary.images, 0);
        assert_eq!(summary.mean_confidence, 0.0);
        assert_eq!(summary.mean_accuracy, 0.0);
    }
}
