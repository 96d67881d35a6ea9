use crate::annotations::bounding_box::BoundingBox;

/// One detection in original-image pixel coordinates.
///
/// `score` is objectness times the selected class probability. `class_id`
/// indexes the detector's own class order; translating it into a dataset
/// category name is the label map's job.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_id: usize,
}
