/// A box in corner form.
///
/// `(xmin, ymin)` is the top-left corner and `(xmax, ymax)` the bottom-right,
/// with the standard image convention of x=0 at the left edge and y=0 at the
/// top. The same struct is used for boxes in network-input coordinates and in
/// original-image coordinates; the two spaces are only ever bridged by the
/// letterbox transform in the box filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    /// Area of the box. Only meaningful once `xmin <= xmax` and
    /// `ymin <= ymax`; callers clip before asking.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box.
    ///
    /// The result is floored at `f32::EPSILON` so that it can be used as a
    /// divisor downstream without a zero check. Callers must not read a
    /// floored value back as "no overlap".
    pub fn intersection_over_union(&self, other: &BoundingBox) -> f32 {
        let left = self.xmin.max(other.xmin);
        let top = self.ymin.max(other.ymin);
        let right = self.xmax.min(other.xmax);
        let bottom = self.ymax.min(other.ymax);

        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        (intersection / union).max(f32::EPSILON)
    }
}
