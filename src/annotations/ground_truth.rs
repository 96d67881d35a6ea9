use crate::annotations::bounding_box::BoundingBox;

/// A ground-truth annotation for one image.
///
/// Carries the category *name* rather than an id: detections and ground
/// truth come from independently-indexed category spaces that only agree on
/// names.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthBox {
    pub category_name: String,
    pub bbox: BoundingBox,
}

impl GroundTruthBox {
    /// Build from the `[x, y, width, height]` form annotation files use.
    pub fn from_xywh(category_name: String, x: f32, y: f32, width: f32, height: f32) -> Self {
        GroundTruthBox {
            category_name,
            bbox: BoundingBox::new(x, y, x + width, y + height),
        }
    }
}
